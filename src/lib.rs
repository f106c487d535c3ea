//! A specification-and-verification workbench core.
//!
//! Arbor embeds a small logic-programming interpreter, loads declarative
//! specifications describing labeled transition systems, and verifies
//! branching-time (CTL) properties over them. Around the interpreter sit a
//! projection layer extracting structural views (state machines, sequence
//! diagrams, chart series) and a guarded stochastic simulator run once per
//! load. The [`engine::Engine`] façade is what a host service talks to;
//! everything it takes and returns is strings, typed records and booleans.
//!
//! Modules, leaves first:
//!
//! - [`term`]: terms, binding environments, unification;
//! - [`parse`]: the clause/goal/formula parsers;
//! - [`db`]: the clause database and helper library;
//! - [`solve`]: SLD resolution with builtins, deadlines and backtracking;
//! - [`ctl`]: the CTL satisfaction engine;
//! - [`project`]: structural views over a loaded specification;
//! - [`sim`]: the guarded random walk;
//! - [`engine`]: the concurrent façade.

#![forbid(missing_docs)]

#[macro_use]
mod macros;

pub mod prelude;

pub mod ctl;
pub mod db;
pub mod engine;
pub mod err;
pub mod parse;
pub mod project;
pub mod sim;
pub mod solve;
pub mod term;

/// String representation of a simple demo specification.
pub const DEMO: &str = r#"% A client/server request loop.
%
% Specifications are plain clauses over a small vocabulary:
%
% - transition(From, Label, To) and initial(State) describe the composed
%   state machine; prop(State, P) labels states with atomic propositions;
% - state_guard/2 and transition_guard/4 name guard goals consulted by the
%   simulator; dice0(Low, High) holds when the step's random sample falls
%   in [Low, High), which is how probabilistic branching is written;
% - actor/2, actor_transition/4 and msg_annotation/3 feed the per-actor
%   and sequence-diagram views; property/3 names CTL formulas to check.
%
% State names are prefixed with their owning actor: `client_idle` belongs
% to actor `client`.

initial(client_idle).
initial(server_ready).

transition(client_idle, send_prompt, client_waiting).
transition(client_waiting, receive_response, client_idle).
transition(server_ready, accept, server_busy).
transition(server_busy, respond, server_ready).
transition(server_busy, drop, server_ready).

% The responder is flaky: one respond in ten is dropped.
transition_guard(server_busy, respond, server_ready, lucky).
transition_guard(server_busy, drop, server_ready, unlucky).

lucky :- dice0(0.0, 0.9).
unlucky :- dice0(0.9, 1.0).

prop(client_idle, quiescent).
prop(server_ready, quiescent).
prop(client_waiting, in_flight).
prop(server_busy, in_flight).

actor(client, client_idle).
actor(server, server_ready).

actor_transition(client, client_idle, send_prompt, client_waiting).
actor_transition(client, client_waiting, receive_response, client_idle).
actor_transition(server, server_ready, accept, server_busy).
actor_transition(server, server_busy, respond, server_ready).

msg_annotation(send_prompt, send, server).
msg_annotation(receive_response, recv, server).

property(responsive, 'every reachable state can return to rest',
    'ag(ef(atom(quiescent)))').
property(classified, 'every reachable state is at rest or in flight',
    'ag(or(atom(quiescent), atom(in_flight)))').

pie_slice(respond, 90).
pie_slice(drop, 10).

line_point(latency, 0, 12).
line_point(latency, 1, 14).
line_point(latency, 2, 11).

doc(overview, 'A client/server request loop with a flaky responder.').
doc(guards, 'The respond/drop split is driven by dice0/2.').
"#;
