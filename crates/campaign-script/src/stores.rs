//! Message and objective stores.
//!
//! Both stores are ordered by insertion and exposed to the UI as live,
//! read-only slices through the host. Scripts mutate them only through
//! [`ScriptContext`](crate::ScriptContext); the host itself only seeds them
//! at `init`, replaces them on `load` and drains them on `done`.

use campaign_types::{
    DocumentError, MessageAudience, Objective, ObjectiveStatus, VideoMessage, XElement,
};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Message queues
// ---------------------------------------------------------------------------

/// An ordered, append-only queue of video messages for one audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQueue {
    audience: MessageAudience,
    messages: Vec<VideoMessage>,
}

impl MessageQueue {
    /// Create an empty queue.
    pub const fn new(audience: MessageAudience) -> Self {
        Self {
            audience,
            messages: Vec::new(),
        }
    }

    /// The audience this queue serves.
    pub const fn audience(&self) -> MessageAudience {
        self.audience
    }

    /// The queued messages, oldest first.
    pub fn as_slice(&self) -> &[VideoMessage] {
        &self.messages
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a message with this id is queued.
    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Append a message. Ids are unique within a queue.
    pub(crate) fn push(&mut self, id: &str, payload: &str) -> Result<(), StoreError> {
        if self.contains(id) {
            return Err(StoreError::DuplicateMessage(id.to_owned()));
        }
        self.messages
            .push(VideoMessage::new(id, self.audience, payload));
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    /// Write the queue as `<name><message id payload/>...</name>`.
    pub fn to_document(&self, name: &str) -> XElement {
        self.messages.iter().fold(XElement::new(name), |doc, m| {
            doc.with_child(
                XElement::new("message")
                    .with("id", &m.id)
                    .with("payload", &m.payload),
            )
        })
    }

    /// Read a queue written by [`to_document`](Self::to_document).
    pub fn from_document(doc: &XElement, audience: MessageAudience) -> Result<Self, StoreError> {
        let mut queue = Self::new(audience);
        for message in doc.children_named("message") {
            queue.push(message.require("id")?, message.require("payload")?)?;
        }
        Ok(queue)
    }
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// The ordered list of mission objectives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectiveList {
    objectives: Vec<Objective>,
}

impl ObjectiveList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            objectives: Vec::new(),
        }
    }

    /// The objectives in the order they were added.
    pub fn as_slice(&self) -> &[Objective] {
        &self.objectives
    }

    /// Look up an objective.
    pub fn get(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    /// Number of objectives.
    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    pub(crate) fn add(&mut self, objective: Objective) -> Result<(), StoreError> {
        if self.get(&objective.id).is_some() {
            return Err(StoreError::DuplicateObjective(objective.id));
        }
        self.objectives.push(objective);
        Ok(())
    }

    /// Move an active objective into a terminal status.
    pub(crate) fn resolve(&mut self, id: &str, status: ObjectiveStatus) -> Result<(), StoreError> {
        let objective = self
            .objectives
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::UnknownObjective(id.to_owned()))?;
        if objective.status.is_terminal() {
            return Err(StoreError::AlreadyTerminal(id.to_owned()));
        }
        objective.status = status;
        Ok(())
    }

    /// Remove a completed or failed objective.
    pub(crate) fn retire(&mut self, id: &str) -> Result<Objective, StoreError> {
        let position = self
            .objectives
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| StoreError::UnknownObjective(id.to_owned()))?;
        let terminal = self
            .objectives
            .get(position)
            .is_some_and(|o| o.status.is_terminal());
        if !terminal {
            return Err(StoreError::StillActive(id.to_owned()));
        }
        Ok(self.objectives.remove(position))
    }

    pub(crate) fn clear(&mut self) {
        self.objectives.clear();
    }

    /// Write the list as `<objectives><objective .../>...</objectives>`.
    pub fn to_document(&self) -> XElement {
        self.objectives
            .iter()
            .fold(XElement::new("objectives"), |doc, o| {
                let mut node = XElement::new("objective")
                    .with("id", &o.id)
                    .with("title", &o.title)
                    .with("status", o.status.as_str())
                    .with("visible", o.visible);
                node.set_text(&o.description);
                doc.with_child(node)
            })
    }

    /// Read a list written by [`to_document`](Self::to_document).
    pub fn from_document(doc: &XElement) -> Result<Self, StoreError> {
        let mut list = Self::new();
        for node in doc.children_named("objective") {
            list.add(objective_from_node(node)?)?;
        }
        Ok(list)
    }
}

/// Parse one `<objective>` node, as used by both config and snapshots.
///
/// The description may be given as text content or as a `description`
/// attribute; `status` defaults to active and `visible` to true.
pub fn objective_from_node(node: &XElement) -> Result<Objective, DocumentError> {
    let description = node
        .text()
        .or_else(|| node.get("description"))
        .unwrap_or_default();
    let mut objective = Objective::active(node.require("id")?, node.require("title")?, description);
    objective.status = node
        .parse("status")?
        .unwrap_or(ObjectiveStatus::Active);
    objective.visible = node.parse("visible")?.unwrap_or(true);
    Ok(objective)
}
