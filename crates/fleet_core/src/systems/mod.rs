pub mod live_monitor;
pub mod motion_tick;
pub mod stage_transition;
