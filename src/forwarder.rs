//! Attaches tag context to a property's raw change signal.

use bevy::log::warn;

use crate::property::ValueChange;
use crate::tag::Tag;

/// A property's value change, labelled with the tag it is registered under.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValueChanged {
    /// Which property changed
    pub tag: Tag,
    /// Value before the change
    pub old: f32,
    /// Value after the change
    pub new: f32,
}

/// One-shot binder between a property and its tag.
///
/// A forwarder starts unbound and can be bound exactly once; later attempts
/// are rejected with a warning and leave the original binding in place. An
/// unbound forwarder drops everything it is asked to forward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeForwarder {
    tag: Option<Tag>,
}

impl ChangeForwarder {
    /// Binds to `tag`. Returns `false` and changes nothing if already bound.
    pub fn bind(&mut self, tag: Tag) -> bool {
        if let Some(existing) = &self.tag {
            warn!(
                "ChangeForwarder already bound to `{}`; ignoring rebind to `{}`",
                existing, tag
            );
            return false;
        }
        self.tag = Some(tag);
        true
    }

    /// True once [`bind`](Self::bind) has succeeded.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.tag.is_some()
    }

    /// The bound tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Labels `change` with the bound tag.
    #[must_use]
    pub fn forward(&self, change: ValueChange) -> Option<PropertyValueChanged> {
        self.tag.as_ref().map(|tag| PropertyValueChanged {
            tag: tag.clone(),
            old: change.old,
            new: change.new,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Tag {
        Tag::new(text).unwrap()
    }

    #[test]
    fn unbound_forwarder_drops_changes() {
        let forwarder = ChangeForwarder::default();
        assert!(!forwarder.is_bound());
        assert_eq!(forwarder.forward(ValueChange { old: 1.0, new: 2.0 }), None);
    }

    #[test]
    fn bound_forwarder_labels_changes() {
        let mut forwarder = ChangeForwarder::default();
        assert!(forwarder.bind(tag("Stat.Health")));
        assert_eq!(
            forwarder.forward(ValueChange { old: 1.0, new: 2.0 }),
            Some(PropertyValueChanged {
                tag: tag("Stat.Health"),
                old: 1.0,
                new: 2.0,
            })
        );
    }

    #[test]
    fn rebinding_is_rejected() {
        let mut forwarder = ChangeForwarder::default();
        assert!(forwarder.bind(tag("A")));
        assert!(!forwarder.bind(tag("B")));
        assert_eq!(forwarder.tag(), Some(&tag("A")));
        let forwarded = forwarder.forward(ValueChange { old: 0.0, new: 1.0 }).unwrap();
        assert_eq!(forwarded.tag, tag("A"));
    }
}
