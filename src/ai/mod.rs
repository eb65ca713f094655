//! AI and navigation module
//!
//! Provides the priority queue and A* pathfinder, steering behaviors, the
//! per-role state machines and the capture referee.

mod fsm;
mod pathfinding;
mod queue;
pub mod referee;
mod sight;
pub mod states;
mod steering;

pub use fsm::{State, StateChange, StateMachine, StateName, Transition};
pub use pathfinding::{Path, PathFollower, find_path};
pub use queue::{PriorityQueue, QueueError};
pub use referee::{Capture, CaptureRules, Census, Outcome};
pub use sight::{ActorSnapshot, Sight, chases_evaders};
pub use states::{AgentContext, Brain, EvaderState, HunterState, PlayerState};
pub use steering::{
    Arrive, AvoidObstacles, Flee, Kinematics, Pursue, Seek, SteeringBehavior, Wander, friction,
    rotate,
};
