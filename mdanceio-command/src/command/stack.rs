use crate::error::MdanceioError;

use super::Command;

/// Linear undo history with a redo tail.
///
/// Holds at most `soft_limit` commands; `hard_limit` caps how far the soft limit may grow.
/// `0 <= offset() <= len() <= soft_limit() <= hard_limit()` holds after every call.
pub struct CommandStack<T> {
    commands: Vec<Box<dyn Command<T>>>,
    hard_limit: usize,
    soft_limit: usize,
    current_index: usize,
    saved_index: Option<usize>,
    is_dirty: bool,
}

impl<T> Default for CommandStack<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HARD_LIMIT)
    }
}

impl<T> std::fmt::Debug for CommandStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStack")
            .field("len", &self.commands.len())
            .field("hard_limit", &self.hard_limit)
            .field("soft_limit", &self.soft_limit)
            .field("current_index", &self.current_index)
            .field("saved_index", &self.saved_index)
            .field("is_dirty", &self.is_dirty)
            .finish()
    }
}

impl<T> CommandStack<T> {
    pub const DEFAULT_HARD_LIMIT: usize = 64;

    pub fn new(soft_limit: usize) -> Self {
        Self::with_limits(soft_limit, Self::DEFAULT_HARD_LIMIT)
    }

    pub fn with_limits(soft_limit: usize, hard_limit: usize) -> Self {
        let hard_limit = hard_limit.max(1);
        Self {
            commands: Vec::new(),
            hard_limit,
            soft_limit: soft_limit.clamp(1, hard_limit),
            current_index: 0,
            saved_index: Some(0),
            is_dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.current_index
    }

    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    pub fn hard_limit(&self) -> usize {
        self.hard_limit
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn can_push(&self) -> bool {
        self.current_index <= self.soft_limit
    }

    pub fn can_undo(&self, target: &T) -> bool {
        self.current_index > 0
            && self
                .commands
                .get(self.current_index - 1)
                .map_or(false, |command| command.can_undo(target))
    }

    pub fn can_redo(&self, target: &T) -> bool {
        self.commands
            .get(self.current_index)
            .map_or(false, |command| command.can_redo(target))
    }

    pub fn undo_command_name(&self) -> Option<&str> {
        self.current_index
            .checked_sub(1)
            .and_then(|index| self.commands.get(index))
            .map(|command| command.name())
    }

    pub fn redo_command_name(&self) -> Option<&str> {
        self.commands
            .get(self.current_index)
            .map(|command| command.name())
    }

    /// Applies `command` and records it.
    ///
    /// The command is recorded even when its redo fails; the failure is handed back so the
    /// caller can report it.
    pub fn push(
        &mut self,
        mut command: Box<dyn Command<T>>,
        target: &mut T,
    ) -> Result<(), MdanceioError> {
        if !self.can_push() || !command.persist_redo(target) {
            log::debug!("Command {} is rejected by the undo stack", command.name());
            return Ok(());
        }
        log::debug!("Push command {}", command.name());
        let result = command.redo(target);
        if self.current_index < self.commands.len() {
            while self.commands.len() > self.current_index {
                self.commands.pop();
            }
            if self.saved_index.map_or(false, |index| index > self.current_index) {
                self.saved_index = None;
            }
            self.commands.push(command);
            self.current_index += 1;
        } else if self.current_index == self.soft_limit {
            self.commands.remove(0);
            self.commands.push(command);
            self.saved_index = self.saved_index.and_then(|index| index.checked_sub(1));
        } else {
            self.commands.push(command);
            self.current_index += 1;
        }
        self.update_dirty();
        result.map_err(|err| {
            log::warn!("Pushed command failed: {}", err);
            err
        })
    }

    pub fn undo(&mut self, target: &mut T) -> Result<(), MdanceioError> {
        if !self.can_undo(target) {
            return Ok(());
        }
        self.current_index -= 1;
        let command = &mut self.commands[self.current_index];
        log::debug!("Undo command {}", command.name());
        let result = if command.persist_undo(target) {
            command.undo(target)
        } else {
            Ok(())
        };
        self.update_dirty();
        result.map_err(|err| {
            log::warn!("Undo failed: {}", err);
            err
        })
    }

    pub fn redo(&mut self, target: &mut T) -> Result<(), MdanceioError> {
        if !self.can_redo(target) {
            return Ok(());
        }
        let command = &mut self.commands[self.current_index];
        self.current_index += 1;
        log::debug!("Redo command {}", command.name());
        let result = if command.persist_redo(target) {
            command.redo(target)
        } else {
            Ok(())
        };
        self.update_dirty();
        result.map_err(|err| {
            log::warn!("Redo failed: {}", err);
            err
        })
    }

    /// Walks the cursor to `value` by repeated redo or undo. Returns the first failure seen.
    pub fn set_offset(&mut self, value: usize, target: &mut T) -> Result<(), MdanceioError> {
        let value = value.min(self.commands.len());
        let mut first_error = None;
        while self.current_index < value && self.can_redo(target) {
            if let Err(err) = self.redo(target) {
                first_error.get_or_insert(err);
            }
        }
        while self.current_index > value && self.can_undo(target) {
            if let Err(err) = self.undo(target) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Changes the active capacity. Values outside `1..=hard_limit` are ignored.
    ///
    /// Shrinking below the current length drops the oldest commands.
    pub fn set_soft_limit(&mut self, value: usize) {
        if value == 0 || value > self.hard_limit {
            log::warn!(
                "Soft limit {} is out of range 1..={}",
                value,
                self.hard_limit
            );
            return;
        }
        if self.commands.len() > value {
            let excess = self.commands.len() - value;
            self.commands.drain(..excess);
            self.current_index = self.current_index.saturating_sub(excess);
            self.saved_index = self.saved_index.and_then(|index| index.checked_sub(excess));
        }
        self.soft_limit = value;
        self.update_dirty();
    }

    /// Records the current cursor as the saved point.
    pub fn mark_saved(&mut self) {
        self.saved_index = Some(self.current_index);
        self.update_dirty();
    }

    pub fn clear(&mut self) {
        while self.commands.pop().is_some() {}
        self.current_index = 0;
        self.saved_index = Some(0);
        self.is_dirty = false;
    }

    fn update_dirty(&mut self) {
        self.is_dirty = self.saved_index != Some(self.current_index);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use crate::error::{DomainType, MdanceioError};

    use super::{Command, CommandStack};

    /// Appends `+name` on redo and `-name` on undo.
    struct TestCommand {
        name: String,
        destroyed: Rc<Cell<usize>>,
        undoable: bool,
        persistent: bool,
        failing: bool,
    }

    impl TestCommand {
        fn boxed(name: &str, destroyed: &Rc<Cell<usize>>) -> Box<dyn Command<Vec<String>>> {
            Box::new(Self::new(name, destroyed))
        }

        fn new(name: &str, destroyed: &Rc<Cell<usize>>) -> Self {
            Self {
                name: name.to_owned(),
                destroyed: destroyed.clone(),
                undoable: true,
                persistent: true,
                failing: false,
            }
        }
    }

    impl Drop for TestCommand {
        fn drop(&mut self) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    impl Command<Vec<String>> for TestCommand {
        fn undo(&mut self, target: &mut Vec<String>) -> Result<(), MdanceioError> {
            target.push(format!("-{}", self.name));
            Ok(())
        }

        fn redo(&mut self, target: &mut Vec<String>) -> Result<(), MdanceioError> {
            target.push(format!("+{}", self.name));
            if self.failing {
                Err(MdanceioError::new("failed", "", DomainType::Command))
            } else {
                Ok(())
            }
        }

        fn can_undo(&self, _target: &Vec<String>) -> bool {
            self.undoable
        }

        fn persist_redo(&self, _target: &Vec<String>) -> bool {
            self.persistent
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn assert_invariant<T>(stack: &CommandStack<T>) {
        assert!(stack.offset() <= stack.len());
        assert!(stack.len() <= stack.soft_limit());
        assert!(stack.soft_limit() <= stack.hard_limit());
    }

    #[test]
    fn test_undo_redo_dirty() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        assert!(!stack.is_dirty());
        stack.push(TestCommand::boxed("a", &destroyed), &mut log).unwrap();
        assert!(stack.is_dirty());
        assert_eq!(vec!["+a"], log);
        stack.undo(&mut log).unwrap();
        assert!(!stack.is_dirty());
        stack.redo(&mut log).unwrap();
        assert!(stack.is_dirty());
        assert_eq!(vec!["+a", "-a", "+a"], log);
        stack.mark_saved();
        assert!(!stack.is_dirty());
        stack.undo(&mut log).unwrap();
        assert!(stack.is_dirty());
        stack.redo(&mut log).unwrap();
        assert!(!stack.is_dirty());
    }

    #[test]
    fn test_undo_redo_on_empty_stack() {
        let mut stack: CommandStack<Vec<String>> = CommandStack::new(4);
        let mut log = vec![];
        assert!(!stack.can_undo(&log));
        assert!(!stack.can_redo(&log));
        stack.undo(&mut log).unwrap();
        stack.redo(&mut log).unwrap();
        assert!(log.is_empty());
        assert_eq!(0, stack.offset());
    }

    #[test]
    fn test_push_after_undo_truncates_redo_tail() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        for name in ["a", "b", "c"] {
            stack.push(TestCommand::boxed(name, &destroyed), &mut log).unwrap();
        }
        stack.undo(&mut log).unwrap();
        stack.undo(&mut log).unwrap();
        assert_eq!(1, stack.offset());
        stack.push(TestCommand::boxed("d", &destroyed), &mut log).unwrap();
        assert_eq!(2, destroyed.get());
        assert_eq!(2, stack.len());
        assert_eq!(2, stack.offset());
        assert!(!stack.can_redo(&log));
        assert_eq!(Some("d"), stack.undo_command_name());
    }

    #[test]
    fn test_evict_oldest_at_soft_limit() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(2);
        let mut log = vec![];
        for name in ["a", "b", "c"] {
            stack.push(TestCommand::boxed(name, &destroyed), &mut log).unwrap();
            assert_invariant(&stack);
        }
        assert_eq!(1, destroyed.get());
        assert_eq!(2, stack.len());
        assert_eq!(2, stack.offset());
        assert!(stack.is_dirty());
        stack.undo(&mut log).unwrap();
        assert_eq!(1, stack.offset());
        assert_eq!(Some("-c"), log.last().map(String::as_str));
        stack.undo(&mut log).unwrap();
        assert_eq!(Some("-b"), log.last().map(String::as_str));
        assert_eq!(0, stack.offset());
        // The saved point was evicted with "a", so the stack never becomes clean again.
        assert!(stack.is_dirty());
        stack.redo(&mut log).unwrap();
        assert_eq!(Some("+b"), log.last().map(String::as_str));
        assert!(stack.is_dirty());
    }

    #[test]
    fn test_fill_hard_limit() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::default();
        let mut log = vec![];
        for i in 0..=CommandStack::<Vec<String>>::DEFAULT_HARD_LIMIT {
            stack
                .push(TestCommand::boxed(&i.to_string(), &destroyed), &mut log)
                .unwrap();
        }
        assert_eq!(1, destroyed.get());
        assert_eq!(CommandStack::<Vec<String>>::DEFAULT_HARD_LIMIT, stack.len());
        assert_eq!(Some("1"), {
            stack.set_offset(0, &mut log).unwrap();
            stack.redo_command_name()
        });
    }

    #[test]
    fn test_clear_destroys_all() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        for name in ["a", "b", "c"] {
            stack.push(TestCommand::boxed(name, &destroyed), &mut log).unwrap();
        }
        stack.undo(&mut log).unwrap();
        stack.clear();
        assert_eq!(3, destroyed.get());
        assert_eq!(0, stack.len());
        assert_eq!(0, stack.offset());
        assert!(!stack.is_dirty());
    }

    #[test]
    fn test_drop_stack_destroys_all() {
        let destroyed = Rc::new(Cell::new(0));
        {
            let mut stack = CommandStack::new(8);
            let mut log = vec![];
            stack.push(TestCommand::boxed("a", &destroyed), &mut log).unwrap();
            stack.push(TestCommand::boxed("b", &destroyed), &mut log).unwrap();
        }
        assert_eq!(2, destroyed.get());
    }

    #[test]
    fn test_can_undo_veto_blocks_traversal() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        let mut command = TestCommand::new("locked", &destroyed);
        command.undoable = false;
        stack.push(Box::new(command), &mut log).unwrap();
        assert!(!stack.can_undo(&log));
        stack.undo(&mut log).unwrap();
        assert_eq!(1, stack.offset());
        assert_eq!(vec!["+locked"], log);
    }

    #[test]
    fn test_persist_redo_veto_rejects_push() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        let mut command = TestCommand::new("vetoed", &destroyed);
        command.persistent = false;
        stack.push(Box::new(command), &mut log).unwrap();
        assert!(log.is_empty());
        assert!(stack.is_empty());
        assert_eq!(1, destroyed.get());
    }

    #[test]
    fn test_failed_redo_still_advances_cursor() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        let mut command = TestCommand::new("broken", &destroyed);
        command.failing = true;
        assert!(stack.push(Box::new(command), &mut log).is_err());
        assert_eq!(1, stack.offset());
        assert!(stack.undo(&mut log).is_ok());
        assert!(stack.redo(&mut log).is_err());
        assert_eq!(1, stack.offset());
    }

    #[test]
    fn test_set_offset() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        for name in ["a", "b", "c", "d"] {
            stack.push(TestCommand::boxed(name, &destroyed), &mut log).unwrap();
        }
        log.clear();
        stack.set_offset(1, &mut log).unwrap();
        assert_eq!(vec!["-d", "-c", "-b"], log);
        log.clear();
        stack.set_offset(3, &mut log).unwrap();
        assert_eq!(vec!["+b", "+c"], log);
        stack.set_offset(100, &mut log).unwrap();
        assert_eq!(4, stack.offset());
    }

    #[test]
    fn test_set_soft_limit_evicts_oldest() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(8);
        let mut log = vec![];
        for name in ["a", "b", "c", "d", "e"] {
            stack.push(TestCommand::boxed(name, &destroyed), &mut log).unwrap();
        }
        stack.undo(&mut log).unwrap();
        stack.set_soft_limit(3);
        assert_eq!(2, destroyed.get());
        assert_eq!(3, stack.len());
        assert_eq!(2, stack.offset());
        assert_eq!(Some("d"), stack.undo_command_name());
        assert_eq!(Some("e"), stack.redo_command_name());
        assert_invariant(&stack);
        stack.set_soft_limit(0);
        stack.set_soft_limit(stack.hard_limit() + 1);
        assert_eq!(3, stack.soft_limit());
    }

    #[test]
    fn test_invariant_holds_for_mixed_sequence() {
        let destroyed = Rc::new(Cell::new(0));
        let mut stack = CommandStack::new(5);
        let mut log = vec![];
        let mut seed = 0x2545_f491u32;
        for i in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            match seed % 7 {
                0 | 1 | 2 => stack
                    .push(TestCommand::boxed(&i.to_string(), &destroyed), &mut log)
                    .unwrap(),
                3 | 4 => stack.undo(&mut log).unwrap(),
                5 => stack.redo(&mut log).unwrap(),
                _ if i % 50 == 0 => stack.clear(),
                _ => stack.mark_saved(),
            }
            assert_invariant(&stack);
        }
    }
}
