use crate::error::MdanceioError;

use super::Command;

/// Groups independent commands into one history step.
///
/// Both directions replay the sub commands in list order, so the grouped commands have to touch
/// disjoint channels.
pub struct BatchUndoCommandListCommand<T> {
    commands: Vec<Box<dyn Command<T>>>,
}

impl<T: 'static> BatchUndoCommandListCommand<T> {
    /// Returns `None` for an empty list and the command itself for a list of one.
    pub fn create(mut commands: Vec<Box<dyn Command<T>>>) -> Option<Box<dyn Command<T>>> {
        match commands.len() {
            0 => None,
            1 => commands.pop(),
            _ => Some(Box::new(Self { commands })),
        }
    }
}

impl<T> BatchUndoCommandListCommand<T> {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn run_all<F>(&mut self, target: &mut T, mut f: F) -> Result<(), MdanceioError>
    where
        F: FnMut(&mut dyn Command<T>, &mut T) -> Result<(), MdanceioError>,
    {
        let mut first_error = None;
        for command in self.commands.iter_mut() {
            if let Err(err) = f(command.as_mut(), target) {
                log::warn!("{} in batch failed: {}", command.name(), err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<T> Command<T> for BatchUndoCommandListCommand<T> {
    fn undo(&mut self, target: &mut T) -> Result<(), MdanceioError> {
        self.run_all(target, |command, target| {
            if command.persist_undo(target) {
                command.undo(target)
            } else {
                Ok(())
            }
        })
    }

    fn redo(&mut self, target: &mut T) -> Result<(), MdanceioError> {
        self.run_all(target, |command, target| {
            if command.persist_redo(target) {
                command.redo(target)
            } else {
                Ok(())
            }
        })
    }

    fn can_undo(&self, target: &T) -> bool {
        self.commands.iter().all(|command| command.can_undo(target))
    }

    fn can_redo(&self, target: &T) -> bool {
        self.commands.iter().all(|command| command.can_redo(target))
    }

    fn name(&self) -> &str {
        "BatchUndoCommandListCommand"
    }
}

#[cfg(test)]
mod tests {
    use crate::{command::Command, error::MdanceioError};

    use super::BatchUndoCommandListCommand;

    struct Append(&'static str);

    impl Command<Vec<String>> for Append {
        fn undo(&mut self, target: &mut Vec<String>) -> Result<(), MdanceioError> {
            target.push(format!("undo {}", self.0));
            Ok(())
        }

        fn redo(&mut self, target: &mut Vec<String>) -> Result<(), MdanceioError> {
            target.push(format!("redo {}", self.0));
            Ok(())
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_batch_of_one_collapses() {
        let commands: Vec<Box<dyn Command<Vec<String>>>> = vec![Box::new(Append("a"))];
        let command = BatchUndoCommandListCommand::create(commands).unwrap();
        assert_eq!("a", command.name());
        assert!(BatchUndoCommandListCommand::<Vec<String>>::create(vec![]).is_none());
    }

    #[test]
    fn test_batch_runs_in_list_order() {
        let mut command = BatchUndoCommandListCommand::create(vec![
            Box::new(Append("a")) as Box<dyn Command<Vec<String>>>,
            Box::new(Append("b")),
        ])
        .unwrap();
        assert_eq!("BatchUndoCommandListCommand", command.name());
        let mut log = vec![];
        command.redo(&mut log).unwrap();
        command.undo(&mut log).unwrap();
        assert_eq!(vec!["redo a", "redo b", "undo a", "undo b"], log);
    }
}
