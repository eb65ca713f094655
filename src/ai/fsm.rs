//! Finite State Machine for AI Behavior
//!
//! States are closed enums: every role has one enum listing all of its
//! states, and the machine owns exactly one value of it. Transitions replace
//! that value, calling `exit` on the old one and `enter` on the new one.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug)]
//! enum Door { Closed, Open }
//!
//! impl StateName for Door {
//!     fn name(&self) -> &'static str {
//!         match self { Door::Closed => "Closed", Door::Open => "Open" }
//!     }
//! }
//!
//! impl State<Sensor> for Door {
//!     fn update(&mut self, ctx: &mut Sensor) -> Transition<Self> {
//!         match self {
//!             Door::Closed if ctx.someone_near => Transition::To(Door::Open),
//!             _ => Transition::None,
//!         }
//!     }
//! }
//!
//! let mut fsm = StateMachine::new(Door::Closed);
//! fsm.update(&mut sensor);
//! ```

use std::fmt;

// ============================================================================
// State Trait
// ============================================================================

/// State name for debugging and logging.
pub trait StateName {
    fn name(&self) -> &'static str;
}

/// A state in the finite state machine.
///
/// The lifecycle is:
///
/// 1. `enter()` - Called once when entering this state
/// 2. `update()` - Called each tick while in this state
/// 3. `exit()` - Called once when leaving this state
pub trait State<Ctx>: StateName + fmt::Debug + Sized {
    /// Called when entering this state.
    fn enter(&mut self, _ctx: &mut Ctx) {}

    /// Called each tick while in this state.
    fn update(&mut self, ctx: &mut Ctx) -> Transition<Self>;

    /// Called when exiting this state.
    fn exit(&mut self, _ctx: &mut Ctx) {}
}

// ============================================================================
// Transition
// ============================================================================

/// Returned from `State::update()`: stay, or move to another state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Stay in the current state.
    None,
    /// Transition to a new state.
    To(S),
}

/// A completed state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: &'static str,
    pub to: &'static str,
}

// ============================================================================
// State Machine
// ============================================================================

/// A finite state machine over the state enum `S`.
pub struct StateMachine<S> {
    /// Current active state
    current: S,
    /// Whether enter() has been called on current state
    entered: bool,
}

impl<S> StateMachine<S> {
    /// Create a new state machine with an initial state.
    ///
    /// The initial state's `enter()` runs on the first `update()`, or on
    /// `start()` if called earlier.
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            entered: false,
        }
    }

    /// The current state.
    pub fn current(&self) -> &S {
        &self.current
    }

    /// Run the initial state's `enter()` if it has not run yet.
    pub fn start<Ctx>(&mut self, ctx: &mut Ctx)
    where
        S: State<Ctx>,
    {
        if !self.entered {
            self.current.enter(ctx);
            self.entered = true;
        }
    }

    /// Update the current state and apply its transition, if any.
    pub fn update<Ctx>(&mut self, ctx: &mut Ctx) -> Option<StateChange>
    where
        S: State<Ctx>,
    {
        self.start(ctx);

        match self.current.update(ctx) {
            Transition::None => None,
            Transition::To(next) => Some(self.switch(ctx, next)),
        }
    }

    /// Force a transition to a new state.
    ///
    /// Immediately exits the current state and enters the new one.
    pub fn transition<Ctx>(&mut self, ctx: &mut Ctx, next: S) -> StateChange
    where
        S: State<Ctx>,
    {
        self.switch(ctx, next)
    }

    fn switch<Ctx>(&mut self, ctx: &mut Ctx, mut next: S) -> StateChange
    where
        S: State<Ctx>,
    {
        if self.entered {
            self.current.exit(ctx);
        }
        let from = self.current.name();
        next.enter(ctx);
        self.current = next;
        self.entered = true;

        StateChange {
            from,
            to: self.current.name(),
        }
    }

    /// Get the name of the current state.
    #[must_use]
    pub fn current_state_name(&self) -> &'static str
    where
        S: StateName,
    {
        self.current.name()
    }

    /// Check if the FSM is in a state with the given name.
    #[must_use]
    pub fn is_in_state(&self, name: &str) -> bool
    where
        S: StateName,
    {
        self.current.name() == name
    }
}

impl<S: fmt::Debug> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("entered", &self.entered)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Guard {
        delta_time: f32,
        can_see_target: bool,
        target_distance: f32,
        log: Vec<String>,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Sentry {
        Idle { idle_time: f32 },
        Chase,
        Attack,
    }

    impl StateName for Sentry {
        fn name(&self) -> &'static str {
            match self {
                Sentry::Idle { .. } => "Idle",
                Sentry::Chase => "Chase",
                Sentry::Attack => "Attack",
            }
        }
    }

    impl State<Guard> for Sentry {
        fn enter(&mut self, ctx: &mut Guard) {
            ctx.log.push(format!("enter {}", self.name()));
        }

        fn update(&mut self, ctx: &mut Guard) -> Transition<Self> {
            match self {
                Sentry::Idle { idle_time } => {
                    *idle_time += ctx.delta_time;
                    if ctx.can_see_target {
                        Transition::To(Sentry::Chase)
                    } else {
                        Transition::None
                    }
                }
                Sentry::Chase if !ctx.can_see_target => {
                    Transition::To(Sentry::Idle { idle_time: 0.0 })
                }
                Sentry::Chase if ctx.target_distance < 2.0 => Transition::To(Sentry::Attack),
                Sentry::Attack if ctx.target_distance > 3.0 => Transition::To(Sentry::Chase),
                _ => Transition::None,
            }
        }

        fn exit(&mut self, ctx: &mut Guard) {
            ctx.log.push(format!("exit {}", self.name()));
        }
    }

    fn idle() -> Sentry {
        Sentry::Idle { idle_time: 0.0 }
    }

    #[test]
    fn test_fsm_initial_state() {
        let fsm = StateMachine::new(idle());
        assert_eq!(fsm.current_state_name(), "Idle");
    }

    #[test]
    fn test_fsm_enter_called_on_first_update() {
        let mut fsm = StateMachine::new(idle());
        let mut ctx = Guard {
            delta_time: 0.5,
            ..Default::default()
        };

        assert!(!fsm.entered);
        assert_eq!(fsm.update(&mut ctx), None);
        assert!(fsm.entered);
        assert_eq!(ctx.log, vec!["enter Idle"]);
        assert_eq!(fsm.current(), &Sentry::Idle { idle_time: 0.5 });

        // Enter runs only once
        fsm.update(&mut ctx);
        assert_eq!(ctx.log.len(), 1);
    }

    #[test]
    fn test_fsm_transition_on_condition() {
        let mut fsm = StateMachine::new(idle());
        let mut ctx = Guard {
            can_see_target: true,
            target_distance: 10.0,
            ..Default::default()
        };

        let change = fsm.update(&mut ctx);

        assert_eq!(
            change,
            Some(StateChange {
                from: "Idle",
                to: "Chase"
            })
        );
        assert_eq!(ctx.log, vec!["enter Idle", "exit Idle", "enter Chase"]);
    }

    #[test]
    fn test_fsm_chase_to_attack_and_back() {
        let mut fsm = StateMachine::new(Sentry::Chase);
        let mut ctx = Guard {
            can_see_target: true,
            target_distance: 1.5,
            ..Default::default()
        };

        fsm.update(&mut ctx);
        assert!(fsm.is_in_state("Attack"));

        ctx.target_distance = 5.0;
        fsm.update(&mut ctx);
        assert!(fsm.is_in_state("Chase"));
    }

    #[test]
    fn test_fsm_forced_transition() {
        let mut fsm = StateMachine::new(idle());
        let mut ctx = Guard::default();

        // Not entered yet: no exit for the initial state
        let change = fsm.transition(&mut ctx, Sentry::Attack);

        assert_eq!(change.to, "Attack");
        assert_eq!(ctx.log, vec!["enter Attack"]);
        assert!(!fsm.is_in_state("Idle"));
    }
}
