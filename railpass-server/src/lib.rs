//! Rail pass planner server.
//!
//! Searches a rail booking site for journeys between stations by driving a
//! browser, and assembles the chosen journeys into an ordered itinerary of
//! pass segments.

pub mod browser;
pub mod cache;
pub mod config;
pub mod domain;
pub mod itinerary;
pub mod parser;
pub mod session;
pub mod stations;
pub mod web;
