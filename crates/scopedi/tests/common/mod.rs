//! Shared fixture types for the integration suites
#![allow(dead_code)]

use std::sync::Arc;

#[derive(Debug)]
pub struct D;

/// Replacement fixture used by the override tests
#[derive(Debug)]
pub struct D1;

#[derive(Debug)]
pub struct B;

#[derive(Debug)]
pub struct C {
    pub d: Arc<D>,
}

#[derive(Debug)]
pub struct A {
    pub b: Arc<B>,
    pub c: Arc<C>,
}

pub const MODES: [scopedi::StrategyMode; 2] = [
    scopedi::StrategyMode::Direct,
    scopedi::StrategyMode::Specialized,
];
