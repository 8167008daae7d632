//! Attachment identity and the registry of per-widget state.
//!
//! An [`AttachmentRef`] is rebuilt along with its content on every upstream
//! change, but the widget it stands for is long-lived. The registry bridges
//! the two: state is keyed by [`AttachmentId`], not by allocation, so a
//! rebuilt ref with the same identity resolves to the same accumulated
//! `size`/`origin` record and the widget neither flickers nor loses its
//! position while the new layout pass runs.
//!
//! Publication discipline: `update_origin` skips unchanged values, so
//! downstream consumers (an overlay renderer) see exactly one notification
//! per actual movement. `update_size` is the single widget-originated
//! relayout trigger and fires its observer synchronously, once per actual
//! size delta.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::fragment::StyledText;
use crate::primitives::{Point, Size};

/// Counter for generated attachment identities.
static ATTACHMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity for one embedded widget.
///
/// Two refs with equal ids are the same logical widget across a content
/// rebuild. Hosts should prefer [`AttachmentId::from_raw`] (an explicit key)
/// or [`AttachmentId::named`] (derived from stable widget structure);
/// [`AttachmentId::unique`] is the generated fallback and changes on every
/// rebuild, which forfeits state preservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentId(pub u64);

impl AttachmentId {
    /// A fresh process-unique identity.
    pub fn unique() -> Self {
        Self(ATTACHMENT_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// A deterministic identity derived from a name.
    ///
    /// Same name always produces the same id. The high bit keeps derived ids
    /// out of the generated-counter space.
    pub fn named(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self(hasher.finish() | (1 << 63))
    }

    /// An identity from an explicit key.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Lifecycle phase of an attachment.
///
/// `Unresolved → Measuring → Placed ⇄ Hidden`. There is no terminal state: a
/// ref whose identity disappears from a rebuild is discarded, not
/// transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentPhase {
    /// Created, no intrinsic size known yet.
    #[default]
    Unresolved,
    /// Intrinsic size known, no geometry query has completed.
    Measuring,
    /// Origin is published and current.
    Placed,
    /// A reconcile pass yielded no geometry for a previously placed widget.
    Hidden,
}

/// One embedded widget as described by the content producer.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    pub id: AttachmentId,
    /// Width and height the widget asks the text engine to reserve.
    pub intrinsic_size: Size,
    /// Styled text substituted for the placeholder on copy/extraction.
    pub replacement: Option<StyledText>,
}

impl AttachmentRef {
    /// A ref with a generated identity (state does not survive rebuilds).
    pub fn unique(intrinsic_size: Size) -> Self {
        Self {
            id: AttachmentId::unique(),
            intrinsic_size,
            replacement: None,
        }
    }

    /// A ref with a name-derived identity.
    pub fn named(name: &str, intrinsic_size: Size) -> Self {
        Self {
            id: AttachmentId::named(name),
            intrinsic_size,
            replacement: None,
        }
    }

    /// A ref with an explicit identity.
    pub fn with_id(id: AttachmentId, intrinsic_size: Size) -> Self {
        Self {
            id,
            intrinsic_size,
            replacement: None,
        }
    }

    pub fn replacement(mut self, text: StyledText) -> Self {
        self.replacement = Some(text);
        self
    }

    pub fn replacement_plain(mut self, text: impl Into<String>) -> Self {
        self.replacement = Some(StyledText::plain(text));
        self
    }
}

/// Registry-side mutable record for one attachment identity.
#[derive(Debug, Clone, Default)]
pub struct AttachmentState {
    /// Current intrinsic size as last reported by the widget host.
    pub size: Size,
    /// Resolved on-screen origin; `None` until placed, and `None` again
    /// whenever layout cannot place the widget.
    pub origin: Option<Point>,
    pub phase: AttachmentPhase,
    /// Ascender cached from surrounding-text font metrics, used to align the
    /// widget baseline when the adjacent font cannot currently be resolved.
    pub(crate) ascender: Option<f32>,
    /// Count of actual origin publications (idempotent skips excluded).
    notifications: u64,
}

impl AttachmentState {
    /// How many origin changes have been published for this attachment.
    pub fn origin_notifications(&self) -> u64 {
        self.notifications
    }
}

type SharedState = Rc<RefCell<AttachmentState>>;
type SizeObserver = Box<dyn Fn(AttachmentId, Size)>;
type OriginObserver = Box<dyn Fn(AttachmentId, Option<Point>)>;

/// Identity-keyed store of attachment state.
///
/// Shared between the reconciliation engine (writer) and position consumers
/// (readers). `Rc<RefCell<_>>` keeps the whole registry UI-thread-affine:
/// none of these types are `Send`, so cross-thread mutation is rejected at
/// compile time rather than aborting at runtime.
#[derive(Default)]
pub struct AttachmentRegistry {
    states: HashMap<AttachmentId, SharedState>,
    size_observers: HashMap<AttachmentId, SizeObserver>,
    origin_observers: HashMap<AttachmentId, OriginObserver>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a ref to its persistent state record.
    ///
    /// An unknown identity gets a fresh record seeded from the ref's
    /// intrinsic size. A known identity keeps its accumulated state: the
    /// host's `update_size` reports are authoritative over whatever size the
    /// rebuilt ref carries.
    pub fn resolve(&mut self, attachment: &AttachmentRef) -> SharedState {
        if let Some(state) = self.states.get(&attachment.id) {
            return Rc::clone(state);
        }

        let phase = if attachment.intrinsic_size == Size::ZERO {
            AttachmentPhase::Unresolved
        } else {
            AttachmentPhase::Measuring
        };
        let state = Rc::new(RefCell::new(AttachmentState {
            size: attachment.intrinsic_size,
            origin: None,
            phase,
            ascender: None,
            notifications: 0,
        }));
        self.states.insert(attachment.id, Rc::clone(&state));
        state
    }

    /// Shared state for an identity, if registered.
    pub fn state(&self, id: AttachmentId) -> Option<SharedState> {
        self.states.get(&id).map(Rc::clone)
    }

    pub fn contains(&self, id: AttachmentId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Register the size-change handler for an identity.
    ///
    /// Fired synchronously from `update_size`, exactly once per actual size
    /// delta. The handler must not call back into the registry.
    pub fn observe_size(&mut self, id: AttachmentId, observer: impl Fn(AttachmentId, Size) + 'static) {
        self.size_observers.insert(id, Box::new(observer));
    }

    /// Register the origin-publication handler for an identity.
    ///
    /// Fired on actual origin changes only; idempotent republishes are
    /// skipped before notification.
    pub fn observe_origin(
        &mut self,
        id: AttachmentId,
        observer: impl Fn(AttachmentId, Option<Point>) + 'static,
    ) {
        self.origin_observers.insert(id, Box::new(observer));
    }

    /// Report a new intrinsic size from the widget host.
    ///
    /// Unchanged size is a no-op. Unknown identity is a no-op, not a fault;
    /// the host may race ahead of registry teardown.
    pub fn update_size(&mut self, id: AttachmentId, size: Size) {
        let Some(state) = self.states.get(&id) else {
            tracing::debug!(id = id.raw(), "size update for unknown attachment ignored");
            return;
        };

        {
            let mut state = state.borrow_mut();
            if state.size == size {
                return;
            }
            state.size = size;
            // A placed widget must be re-measured before its origin is
            // trustworthy again.
            state.phase = match state.phase {
                AttachmentPhase::Unresolved => AttachmentPhase::Measuring,
                AttachmentPhase::Placed => AttachmentPhase::Measuring,
                other => other,
            };
        }

        if let Some(observer) = self.size_observers.get(&id) {
            observer(id, size);
        }
    }

    /// Publish a resolved origin (or `None` to hide the widget).
    ///
    /// Idempotent: publishing the current value again does nothing and emits
    /// no notification. Unknown identity is a no-op. Returns whether the
    /// value actually changed.
    pub fn update_origin(&mut self, id: AttachmentId, origin: Option<Point>) -> bool {
        let Some(state) = self.states.get(&id) else {
            tracing::debug!(id = id.raw(), "origin update for unknown attachment ignored");
            return false;
        };

        {
            let mut state = state.borrow_mut();
            if state.origin == origin {
                // Re-measurement confirming unchanged geometry still settles
                // the phase, without notifying anyone.
                if origin.is_some() {
                    state.phase = AttachmentPhase::Placed;
                }
                return false;
            }
            state.origin = origin;
            state.phase = match origin {
                Some(_) => AttachmentPhase::Placed,
                None => match state.phase {
                    AttachmentPhase::Placed => AttachmentPhase::Hidden,
                    other => other,
                },
            };
            state.notifications += 1;
            tracing::trace!(id = id.raw(), ?origin, "origin published");
        }

        if let Some(observer) = self.origin_observers.get(&id) {
            observer(id, origin);
        }
        true
    }

    /// Drop state for every identity not present in `live`.
    ///
    /// Called after a content rebuild: surviving identities keep their
    /// accumulated state, omitted identities leak nothing.
    pub fn retain(&mut self, live: &HashSet<AttachmentId>) {
        self.states.retain(|id, _| live.contains(id));
        self.size_observers.retain(|id, _| live.contains(id));
        self.origin_observers.retain(|id, _| live.contains(id));
    }
}
