//! Where a session reports what happened.

use rallypoint_combat::CombatNotice;
use rallypoint_room::LifecycleNotice;
use tokio::sync::mpsc;

/// Anything the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Lifecycle(LifecycleNotice),
    Combat(CombatNotice),
}

impl From<LifecycleNotice> for Notice {
    fn from(notice: LifecycleNotice) -> Self {
        Self::Lifecycle(notice)
    }
}

impl From<CombatNotice> for Notice {
    fn from(notice: CombatNotice) -> Self {
        Self::Combat(notice)
    }
}

/// Receives notices at the end of every tick, in the order they happened.
pub trait NoticeSink: Send {
    fn notify(&mut self, notice: Notice);
}

impl<F> NoticeSink for F
where
    F: FnMut(Notice) + Send,
{
    fn notify(&mut self, notice: Notice) {
        self(notice)
    }
}

/// Forwards notices to another task. Dropped silently once the receiver
/// is gone.
impl NoticeSink for mpsc::UnboundedSender<Notice> {
    fn notify(&mut self, notice: Notice) {
        let _ = self.send(notice);
    }
}
