//! Projection of a loaded specification into typed structural views.
//!
//! Every view is produced by issuing fixed goals against the resolver and
//! collecting bindings. Absent predicates or failing queries yield empty
//! views, never errors: a specification without charts is fine, and a
//! runaway user rule behind `transition/3` must not take the whole
//! visualization surface down with it (the failure is logged).

prelude!();

use serde::{Deserialize, Serialize};
use crate::solve::Solver;
use crate::term::{Term, Var};


/// A labeled transition of the composed state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Source state.
    pub from: String,
    /// Transition label.
    pub label: String,
    /// Target state.
    pub to: String,
}

/// The composed state machine view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    /// States, in first-appearance order.
    pub states: Vec<String>,
    /// Transitions, in clause order.
    pub transitions: Vec<Transition>,
    /// Initial states.
    pub initial: Vec<String>,
    /// Accepting states.
    pub accepting: Vec<String>,
}

/// One actor's state machine, from `actor_transition/4`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorMachine {
    /// Actor name.
    pub actor: String,
    /// The actor's states, in first-appearance order.
    pub states: Vec<String>,
    /// The actor's transitions, in clause order.
    pub transitions: Vec<Transition>,
    /// Initial state, from `actor(Name, Init)` when present.
    pub initial: Option<String>,
}

/// A message of the sequence diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sequence number.
    pub seq: usize,
    /// Sending lifeline.
    pub from: String,
    /// Receiving lifeline.
    pub to: String,
    /// Message label.
    pub label: String,
}

/// The sequence diagram view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceDiagram {
    /// Participants.
    pub lifelines: Vec<String>,
    /// Messages, ordered by sequence number.
    pub messages: Vec<Message>,
}

/// A slice of the pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    /// Slice label.
    pub label: String,
    /// Slice value.
    pub value: f64,
}

/// A bar of the bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarValue {
    /// Bar label.
    pub label: String,
    /// Bar value.
    pub value: f64,
}

/// A point of a line series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Abscissa.
    pub x: f64,
    /// Ordinate.
    pub y: f64,
}

/// A line-chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    /// Series name.
    pub name: String,
    /// Points, in clause order.
    pub points: Vec<Point>,
}

/// A named property: a CTL formula with a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Human description.
    pub description: String,
    /// CTL formula source, parsed on demand.
    pub formula: String,
}

/// A documentation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    /// Topic.
    pub topic: String,
    /// Content.
    pub content: String,
}

/// Collects the solutions of `goal` as rows of the given variables.
///
/// A failing query logs and yields no rows.
fn rows(solver: &mut Solver, goal: &Term, vars: &[&str]) -> Vec<Vec<Term>> {
    let template = Term::list(vars.iter().map(|v| Term::var(Var::new(*v))).collect());
    match solver.collect(goal, &template) {
        Ok(terms) => terms
            .iter()
            .filter_map(|t| {
                t.as_list()
                    .map(|elems| elems.into_iter().cloned().collect())
            })
            .collect(),
        Err(e) => {
            tracing::warn!(goal = %goal, error = %e, "projection query failed, view left empty");
            vec![]
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn numeric(term: &Term) -> f64 {
    term.as_f64().unwrap_or(0.0)
}

/// Extracts the composed state machine.
///
/// The state set is the union of sources and targets of `transition/3`,
/// together with `initial/1` and `accepting/1`.
pub fn state_machine(solver: &mut Solver) -> StateMachine {
    let mut sm = StateMachine::default();
    for row in rows(
        solver,
        &build_term!((transition (var From) (var Label) (var To))),
        &["From", "Label", "To"],
    ) {
        let (from, label, to) = (row[0].text(), row[1].text(), row[2].text());
        push_unique(&mut sm.states, &from);
        push_unique(&mut sm.states, &to);
        sm.transitions.push(Transition { from, label, to });
    }
    for row in rows(solver, &build_term!((initial (var S))), &["S"]) {
        let state = row[0].text();
        push_unique(&mut sm.states, &state);
        push_unique(&mut sm.initial, &state);
    }
    for row in rows(solver, &build_term!((accepting (var S))), &["S"]) {
        let state = row[0].text();
        push_unique(&mut sm.states, &state);
        push_unique(&mut sm.accepting, &state);
    }
    sm
}

/// Extracts per-actor state machines from `actor_transition/4`.
pub fn actor_machines(solver: &mut Solver) -> Vec<ActorMachine> {
    let mut machines: IndexMap<String, ActorMachine> = IndexMap::new();
    for row in rows(
        solver,
        &build_term!((actor_transition (var A) (var From) (var Label) (var To))),
        &["A", "From", "Label", "To"],
    ) {
        let actor = row[0].text();
        let machine = machines
            .entry(actor.clone())
            .or_insert_with(|| ActorMachine {
                actor,
                ..ActorMachine::default()
            });
        let (from, label, to) = (row[1].text(), row[2].text(), row[3].text());
        push_unique(&mut machine.states, &from);
        push_unique(&mut machine.states, &to);
        machine.transitions.push(Transition { from, label, to });
    }
    for row in rows(solver, &build_term!((actor (var A) (var Init))), &["A", "Init"]) {
        if let Some(machine) = machines.get_mut(&row[0].text()) {
            machine.initial = Some(row[1].text());
        }
    }
    machines.into_values().collect()
}

/// Extracts the sequence diagram.
///
/// Primary source: `lifeline/1` and `message/4`, ordered by sequence
/// number. When no `message/4` is defined, messages are synthesized from
/// `msg_annotation(Label, Direction, Peer)` and
/// `actor_transition(Actor, From, Label, To)`: each annotated actor
/// transition emits actor→peer for `send` and peer→actor for `recv`, with
/// sequence numbers assigned in enumeration order.
pub fn sequence_diagram(solver: &mut Solver) -> SequenceDiagram {
    let mut diagram = SequenceDiagram::default();
    for row in rows(solver, &build_term!((lifeline (var L))), &["L"]) {
        push_unique(&mut diagram.lifelines, &row[0].text());
    }

    let mut messages = vec![];
    for row in rows(
        solver,
        &build_term!((message (var Seq) (var From) (var To) (var Label))),
        &["Seq", "From", "To", "Label"],
    ) {
        messages.push(Message {
            seq: numeric(&row[0]) as usize,
            from: row[1].text(),
            to: row[2].text(),
            label: row[3].text(),
        });
    }
    messages.sort_by_key(|m| m.seq);

    if messages.is_empty() {
        synthesize_messages(solver, &mut diagram);
    } else {
        diagram.messages = messages;
    }
    diagram
}

/// The `msg_annotation`/`actor_transition` fallback of
/// [`sequence_diagram`].
fn synthesize_messages(solver: &mut Solver, diagram: &mut SequenceDiagram) {
    let mut annotations: IndexMap<String, Vec<(String, String)>> = IndexMap::new();
    for row in rows(
        solver,
        &build_term!((msg_annotation (var Label) (var Dir) (var Peer))),
        &["Label", "Dir", "Peer"],
    ) {
        annotations
            .entry(row[0].text())
            .or_default()
            .push((row[1].text(), row[2].text()));
    }
    if annotations.is_empty() {
        return;
    }

    let mut seq = 1;
    for row in rows(
        solver,
        &build_term!((actor_transition (var Actor) (var From) (var Label) (var To))),
        &["Actor", "From", "Label", "To"],
    ) {
        let actor = row[0].text();
        let label = row[2].text();
        let Some(entries) = annotations.get(&label) else {
            continue;
        };
        for (direction, peer) in entries {
            let (from, to) = match direction.as_str() {
                "send" => (actor.clone(), peer.clone()),
                "recv" => (peer.clone(), actor.clone()),
                _ => continue,
            };
            push_unique(&mut diagram.lifelines, &from);
            push_unique(&mut diagram.lifelines, &to);
            diagram.messages.push(Message {
                seq,
                from,
                to,
                label: label.clone(),
            });
            seq += 1;
        }
    }
}

/// Extracts the pie series from `pie_slice/2`.
pub fn pie_chart(solver: &mut Solver) -> Vec<PieSlice> {
    rows(
        solver,
        &build_term!((pie_slice (var Label) (var Value))),
        &["Label", "Value"],
    )
    .into_iter()
    .map(|row| PieSlice {
        label: row[0].text(),
        value: numeric(&row[1]),
    })
    .collect()
}

/// Extracts the bar series from `bar_value/2`.
pub fn bar_chart(solver: &mut Solver) -> Vec<BarValue> {
    rows(
        solver,
        &build_term!((bar_value (var Label) (var Value))),
        &["Label", "Value"],
    )
    .into_iter()
    .map(|row| BarValue {
        label: row[0].text(),
        value: numeric(&row[1]),
    })
    .collect()
}

/// Extracts the line series from `line_point/3`, grouped by series name in
/// first-appearance order.
pub fn line_chart(solver: &mut Solver) -> Vec<LineSeries> {
    let mut series: IndexMap<String, Vec<Point>> = IndexMap::new();
    for row in rows(
        solver,
        &build_term!((line_point (var Series) (var X) (var Y))),
        &["Series", "X", "Y"],
    ) {
        series.entry(row[0].text()).or_default().push(Point {
            x: numeric(&row[1]),
            y: numeric(&row[2]),
        });
    }
    series
        .into_iter()
        .map(|(name, points)| LineSeries { name, points })
        .collect()
}

/// Extracts the named properties from `property/3`.
pub fn properties(solver: &mut Solver) -> Vec<Property> {
    rows(
        solver,
        &build_term!((property (var Name) (var Desc) (var Formula))),
        &["Name", "Desc", "Formula"],
    )
    .into_iter()
    .map(|row| Property {
        name: row[0].text(),
        description: row[1].text(),
        formula: row[2].text(),
    })
    .collect()
}

/// Extracts documentation entries from `doc/2`.
pub fn docs(solver: &mut Solver) -> Vec<Doc> {
    rows(
        solver,
        &build_term!((doc (var Topic) (var Content))),
        &["Topic", "Content"],
    )
    .into_iter()
    .map(|row| Doc {
        topic: row[0].text(),
        content: row[1].text(),
    })
    .collect()
}

/// Extracts the actors: union of `actor/1` and the first argument of
/// `actor/2`, de-duplicated in appearance order.
pub fn actors(solver: &mut Solver) -> Vec<String> {
    let mut actors = vec![];
    for row in rows(solver, &build_term!((actor (var Name))), &["Name"]) {
        push_unique(&mut actors, &row[0].text());
    }
    for row in rows(
        solver,
        &build_term!((actor (var Name) (var _Init))),
        &["Name"],
    ) {
        push_unique(&mut actors, &row[0].text());
    }
    actors
}
