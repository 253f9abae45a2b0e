use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// One commit as reported by `log`.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct LogEntry {
    pub hash: ObjectId,
    pub message: String,
    pub date: chrono::DateTime<chrono::FixedOffset>,
}

impl LogEntry {
    pub fn from_commit(hash: ObjectId, commit: &Commit) -> Self {
        Self::new(hash, commit.message().to_string(), commit.timestamp())
    }
}

/// First-parent walk from a starting commit, newest first.
#[derive(new)]
pub struct RevList<'r> {
    database: &'r Database,
    start: Option<ObjectId>,
}

impl<'r> IntoIterator for RevList<'r> {
    type Item = anyhow::Result<LogEntry>;
    type IntoIter = RevListIntoIter<'r>;

    fn into_iter(self) -> Self::IntoIter {
        RevListIntoIter {
            database: self.database,
            current_commit_oid: self.start,
        }
    }
}

pub struct RevListIntoIter<'r> {
    database: &'r Database,
    current_commit_oid: Option<ObjectId>,
}

impl Iterator for RevListIntoIter<'_> {
    type Item = anyhow::Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let commit_oid = self.current_commit_oid.take()?;

        match self.database.parse_object_as_commit(&commit_oid) {
            Ok(Some(commit)) => {
                self.current_commit_oid = commit.parent().cloned();
                Some(Ok(LogEntry::from_commit(commit_oid, &commit)))
            }
            Ok(None) => Some(Err(anyhow::anyhow!(
                "Object {commit_oid} in history is not a commit"
            ))),
            Err(error) => Some(Err(error)),
        }
    }
}
