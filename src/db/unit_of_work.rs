//! Scoped write transaction that owns its connection.
//!
//! A [`UnitOfWork`] can be moved between async stages and blocking workers.
//! Unless [`UnitOfWork::commit`] succeeds, dropping it rolls back everything
//! it did, including reads whose results the caller acted on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rusqlite::{ffi, Connection, InterruptHandle};

pub struct UnitOfWork {
    conn: Connection,
    open: bool,
    cancelled: Arc<AtomicBool>,
}

impl UnitOfWork {
    /// Start an immediate (write-locking) transaction on `conn`.
    ///
    /// Taking the write lock up front means the reads made inside this unit of
    /// work cannot be invalidated by another writer before commit.
    pub fn begin(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            open: true,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// A guard that, when dropped while armed, marks this unit of work cancelled
    /// and interrupts any statement running on its connection.
    pub fn cancel_guard(&self) -> CancelGuard {
        CancelGuard {
            cancelled: Arc::clone(&self.cancelled),
            interrupt: Some(self.conn.get_interrupt_handle()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Commit, unless the owning operation was cancelled in the meantime.
    pub fn commit(mut self) -> rusqlite::Result<()> {
        if self.is_cancelled() {
            return Err(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_INTERRUPT),
                Some("unit of work cancelled before commit".into()),
            ));
        }
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }

    /// Roll back explicitly. Equivalent to dropping, but surfaces the error.
    pub fn rollback(mut self) -> rusqlite::Result<()> {
        self.open = false;
        self.conn.execute_batch("ROLLBACK")
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        // An interrupted statement may already have rolled SQLite back.
        if self.conn.is_autocommit() {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(error = %e, "rollback of abandoned unit of work failed");
        } else {
            tracing::debug!("abandoned unit of work rolled back");
        }
    }
}

/// See [`UnitOfWork::cancel_guard`]. Call [`CancelGuard::disarm`] once the
/// unit of work has finished.
pub struct CancelGuard {
    cancelled: Arc<AtomicBool>,
    interrupt: Option<InterruptHandle>,
}

impl CancelGuard {
    pub fn disarm(mut self) {
        self.interrupt = None;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.interrupt.take() {
            self.cancelled.store(true, Ordering::SeqCst);
            handle.interrupt();
        }
    }
}
