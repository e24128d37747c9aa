pub mod events;
pub mod movement;
pub mod room;
pub mod team;
pub mod terrain;
