use std::{fs, marker::PhantomData, path::PathBuf};

/// Undo steps recorded while a template is written to disk.
#[derive(Debug)]
pub enum RollbackOperation {
    /// A file this run created.
    RemoveFile(PathBuf),
    /// A directory this run created.
    RemoveDir(PathBuf),
    /// A file this run overwrote, with its previous contents.
    RestoreFile(PathBuf, Vec<u8>),
}
/// Active Transaction
pub struct Active;
/// Committed Transaction
pub struct Committed;
/// A trait that tells us if rollback should occur when dropped.
pub trait TransactionState {
    const SHOULD_ROLLBACK: bool;
}
impl TransactionState for Active {
    const SHOULD_ROLLBACK: bool = true;
}
impl TransactionState for Committed {
    const SHOULD_ROLLBACK: bool = false;
}
/// Tracks the filesystem changes made while applying a template.
///
/// The state parameter decides what happens on drop. An `Active` transaction
/// undoes every registered operation in reverse order, so an error half way
/// through writing a template leaves the tree as it was. Calling
/// [`Transaction::commit`] keeps the changes.
///
/// Only paths the run actually created (or overwrote) should be registered: a
/// `RemoveDir` is recursive.
///
/// # Example
///
/// ```rust
/// use uecli::transactions::{Active, RollbackOperation, Transaction};
///
/// let mut trx = Transaction::<Active>::new();
/// trx.add_operation(RollbackOperation::RemoveFile("some/path".into()));
/// trx.commit(); // No rollback will happen
/// ```
pub struct Transaction<State: TransactionState> {
    rollback_operations: Vec<RollbackOperation>,
    state: PhantomData<State>,
}
impl Default for Transaction<Active> {
    fn default() -> Self {
        Self::new()
    }
}
impl Transaction<Active> {
    pub fn new() -> Self {
        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
    /// Adds a rollback operation to the current transaction.
    pub fn add_operation(&mut self, operation: RollbackOperation) {
        self.rollback_operations.push(operation);
    }
    /// Finalizes the transaction, preventing any rollback from occurring.
    pub fn commit(mut self) -> Transaction<Committed> {
        self.rollback_operations.clear();

        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
}
impl<S: TransactionState> Drop for Transaction<S> {
    fn drop(&mut self) {
        if S::SHOULD_ROLLBACK && !self.rollback_operations.is_empty() {
            log::debug!("rolling back {} operations", self.rollback_operations.len());
            while let Some(operation) = self.rollback_operations.pop() {
                match operation {
                    RollbackOperation::RemoveDir(path) => {
                        log::debug!("removing dir: {}", path.display());
                        let _ = fs::remove_dir_all(&path);
                    }
                    RollbackOperation::RemoveFile(path) => {
                        log::debug!("removing file: {}", path.display());
                        let _ = fs::remove_file(&path);
                    }
                    RollbackOperation::RestoreFile(path, contents) => {
                        log::debug!("restoring file: {}", path.display());
                        let _ = fs::write(&path, contents);
                    }
                }
            }
        } else if !S::SHOULD_ROLLBACK {
            log::debug!("committing transaction");
        }
    }
}
