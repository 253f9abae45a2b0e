use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::workspace::containment::VCS_DIR;
use std::path::Path;

/// Version-control repository living inside one working tree.
///
/// Every field is a view onto `<root>/.git` or the root itself; nothing is
/// read from disk until an operation asks for it.
#[derive(Debug)]
pub struct Repository {
    path: Box<Path>,
    index: Index,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    pub fn new(root: &Path) -> Self {
        let git_path = root.join(VCS_DIR);

        Repository {
            path: root.to_path_buf().into_boxed_path(),
            index: Index::new(git_path.join("index").into_boxed_path()),
            database: Database::new(git_path.join("objects").into_boxed_path()),
            workspace: Workspace::new(root.to_path_buf().into_boxed_path()),
            refs: Refs::new(git_path.into_boxed_path()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }
}
