//! Runs the state machine against a backend, one request at a time.

use crate::backend::{execute, GameBackend, Request};
use crate::scheduler::{Scheduler, TimerQueue};
use crate::typewriter::Typewriter;
use crate::universe::UniverseId;

use super::machine::SessionMachine;

/// A session wired to a backend.
///
/// Each operation issues at most one user-initiated request, awaits it and
/// then follows up on whatever the machine asks for next (such as the status
/// refresh after an action).
pub struct Session<B: GameBackend, S: Scheduler = TimerQueue> {
    machine: SessionMachine<S>,
    backend: B,
}

impl<B: GameBackend> Session<B, TimerQueue> {
    pub fn new(backend: B) -> Self {
        Self::with_machine(backend, SessionMachine::new())
    }
}

impl<B: GameBackend, S: Scheduler> Session<B, S> {
    pub fn with_machine(backend: B, machine: SessionMachine<S>) -> Self {
        Self { machine, backend }
    }

    pub fn with_typewriter(backend: B, typewriter: Typewriter<S>) -> Self {
        Self::with_machine(backend, SessionMachine::with_typewriter(typewriter))
    }

    pub fn machine(&self) -> &SessionMachine<S> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut SessionMachine<S> {
        &mut self.machine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn start(&mut self) {
        let request = self.machine.start();
        self.run(request).await;
    }

    pub async fn choose_universe(&mut self, universe: impl Into<UniverseId>) {
        let request = self.machine.choose_universe(universe.into());
        self.run(request).await;
    }

    pub async fn choose_custom_universe(&mut self, rules: &str) {
        let request = self.machine.choose_custom_universe(rules);
        self.run(request).await;
    }

    pub async fn create_character(&mut self, prompt: &str) {
        let request = self.machine.create_character(prompt);
        self.run(request).await;
    }

    pub async fn perform_action(&mut self, text: &str) {
        let request = self.machine.perform_action(text);
        self.run(request).await;
    }

    pub async fn save(&mut self) {
        let request = self.machine.save();
        self.run(request).await;
    }

    pub async fn load(&mut self, save_text: &str) {
        let request = self.machine.load(save_text);
        self.run(request).await;
    }

    pub async fn refresh_status(&mut self) {
        let request = self.machine.refresh_status();
        self.run(request).await;
    }

    pub async fn poll_health(&mut self) {
        let request = self.machine.poll_health();
        self.run(Some(request)).await;
    }

    pub async fn new_game(&mut self) {
        let request = self.machine.new_game();
        self.run(request).await;
    }

    async fn run(&mut self, mut request: Option<Request>) {
        while let Some(next) = request {
            let reply = execute(&self.backend, next).await;
            request = self.machine.apply(reply);
        }
    }
}
