use bitflags::bitflags;

bitflags! {
    // Bit set in the segment header of a request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub(crate) struct CommandOptions: u8 {
        const HOLD_CURSORS_OVER_COMMIT = 0b0000_1000;
        const HOLD_CURSORS_OVER_ROLLBACK = 0b0100_0000;
        const EMPTY = 0;
    }
}
impl Default for CommandOptions {
    fn default() -> Self {
        Self::HOLD_CURSORS_OVER_COMMIT
    }
}

impl CommandOptions {
    pub(crate) fn is_hold_cursors_over_commit(self) -> bool {
        self.contains(CommandOptions::HOLD_CURSORS_OVER_COMMIT)
    }
    pub(crate) fn is_hold_cursors_over_rollback(self) -> bool {
        self.contains(CommandOptions::HOLD_CURSORS_OVER_ROLLBACK)
    }
    pub(crate) fn as_u8(self) -> u8 {
        self.bits()
    }
}

/// Determines how long result set cursors survive transaction boundaries.
#[derive(Debug)]
pub enum CursorHoldability {
    /// Cursors are dropped with commit or rollback.
    None,
    /// Cursors are kept over a commit (this is the default).
    Commit,
    /// Cursors are kept over a rollback.
    Rollback,
    /// Cursors are kept over commits and rollbacks.
    CommitAndRollback,
}
impl From<CommandOptions> for CursorHoldability {
    fn from(value: CommandOptions) -> Self {
        if value.is_hold_cursors_over_commit() {
            if value.is_hold_cursors_over_rollback() {
                Self::CommitAndRollback
            } else {
                Self::Commit
            }
        } else if value.is_hold_cursors_over_rollback() {
            Self::Rollback
        } else {
            Self::None
        }
    }
}
impl From<CursorHoldability> for CommandOptions {
    fn from(value: CursorHoldability) -> Self {
        match value {
            CursorHoldability::None => CommandOptions::EMPTY,
            CursorHoldability::Commit => CommandOptions::HOLD_CURSORS_OVER_COMMIT,
            CursorHoldability::Rollback => CommandOptions::HOLD_CURSORS_OVER_ROLLBACK,
            CursorHoldability::CommitAndRollback => {
                CommandOptions::HOLD_CURSORS_OVER_COMMIT
                    | CommandOptions::HOLD_CURSORS_OVER_ROLLBACK
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{CommandOptions, CursorHoldability};

    #[test]
    fn test_command_options() {
        assert_eq!(CommandOptions::default().as_u8(), 0b0000_1000);

        let co: CommandOptions = CursorHoldability::Rollback.into();
        assert_eq!(co, CommandOptions::HOLD_CURSORS_OVER_ROLLBACK);

        let co: CommandOptions = CursorHoldability::CommitAndRollback.into();
        assert_eq!(co.as_u8(), 0b0100_1000);
    }
}
