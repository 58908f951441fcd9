//! AgentLab Core: domain types, policies, trainable agents and the backtest engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (market states, actions, trades, experiences, the account)
//! - Policy trait plus threshold, momentum and scripted rules
//! - Trainable agents (DQN and PPO stand-ins) with an experience replay buffer
//! - Bar-by-bar backtest loop with daily equity sampling
//! - Performance metrics (return, Sharpe, drawdown, win rate)
//! - Indicator pipeline and feed builder, synthetic data, seeded RNG hierarchy

pub mod agent;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod metrics;
pub mod policy;
pub mod rng;
pub mod synthetic;

pub use engine::{run, BacktestError, BacktestResult};
