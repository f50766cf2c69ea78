pub mod clock;
pub mod knowledge;
pub mod organizer;
pub mod parse;

use std::sync::Arc;

use crate::kernel::actions::ActionRegistry;

/// Register every built-in action.
pub fn register_builtin(registry: &mut ActionRegistry) {
    registry.register(Arc::new(clock::SimpleReply));
    registry.register(Arc::new(clock::CurrentTime));
    registry.register(Arc::new(clock::CurrentDate));
    registry.register(Arc::new(organizer::StartTimerDialogue));
    registry.register(Arc::new(organizer::CreateTimer));
    registry.register(Arc::new(organizer::QueryTimer));
    registry.register(Arc::new(organizer::CreateReminder));
    registry.register(Arc::new(organizer::TodaysReminders));
    registry.register(Arc::new(organizer::CreateAlarm));
    registry.register(Arc::new(organizer::ListAlarms));
    registry.register(Arc::new(knowledge::LearnFact));
    registry.register(Arc::new(knowledge::RecallFact));
    registry.register(Arc::new(knowledge::LearnAlias));
}
