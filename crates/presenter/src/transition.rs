//! Per-transition state machine: `Idle -> FadingOut -> Swapping -> FadingIn -> Idle`.
//!
//! Each transition is identified by a [`TransitionTicket`]. Starting a new
//! transition supersedes the previous one, and every deferred step must present
//! the ticket it was scheduled with; stale tickets are refused.

/// Identifies one requested slide transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionTicket {
    pub target: usize,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPhase {
    #[default]
    Idle,
    FadingOut(TransitionTicket),
    Swapping(TransitionTicket),
    FadingIn(TransitionTicket),
}

impl TransitionPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Default)]
pub struct Transition {
    phase: TransitionPhase,
    generation: u64,
}

impl Transition {
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Starts fading out towards `target`, superseding whatever was in flight.
    pub fn begin(&mut self, target: usize) -> TransitionTicket {
        self.generation += 1;
        let ticket = TransitionTicket {
            target,
            generation: self.generation,
        };
        self.phase = TransitionPhase::FadingOut(ticket);
        ticket
    }

    pub fn is_current(&self, ticket: TransitionTicket) -> bool {
        ticket.generation == self.generation
    }

    /// `FadingOut -> Swapping`, only for the live ticket whose target is still
    /// the authoritative slide index.
    pub fn start_swap(&mut self, ticket: TransitionTicket, current_index: usize) -> bool {
        match self.phase {
            TransitionPhase::FadingOut(live) if live == ticket && ticket.target == current_index => {
                self.phase = TransitionPhase::Swapping(ticket);
                true
            }
            _ => false,
        }
    }

    /// `Swapping -> FadingIn`.
    pub fn finish_swap(&mut self, ticket: TransitionTicket) -> bool {
        match self.phase {
            TransitionPhase::Swapping(live) if live == ticket => {
                self.phase = TransitionPhase::FadingIn(ticket);
                true
            }
            _ => false,
        }
    }

    /// `FadingIn -> Idle`.
    pub fn settle(&mut self, ticket: TransitionTicket) -> bool {
        match self.phase {
            TransitionPhase::FadingIn(live) if live == ticket => {
                self.phase = TransitionPhase::Idle;
                true
            }
            _ => false,
        }
    }
}
