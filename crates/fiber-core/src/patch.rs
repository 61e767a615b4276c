//! Attribute and listener patching for a single host node.

use crate::element::{event_kind, is_event_key, Listener, PropValue, Props};
use crate::host::{Host, HostError, NodeId};

/// Creates the host node for a host fiber and applies its initial props.
/// `tag` is `None` for text.
pub fn create_node(
    host: &mut dyn Host,
    tag: Option<&str>,
    props: &Props,
) -> Result<NodeId, HostError> {
    let node = match tag {
        Some(tag) => host.create_element(tag)?,
        None => host.create_text_node("")?,
    };
    update_node(host, node, &Props::default(), props)?;
    Ok(node)
}

fn changed(prev: &Props, next: &Props, key: &str) -> bool {
    prev.get(key) != next.get(key)
}

fn listener_of<'a>(key: &str, value: &'a PropValue) -> Option<&'a Listener> {
    let listener = value.as_listener();
    if listener.is_none() {
        log::warn!("ignoring {key}: value is not a listener");
    }
    listener
}

/// Brings `node` from `prev` to `next`: stale listeners go first, then
/// vanished attributes, then new or changed attributes, then new listeners.
pub fn update_node(
    host: &mut dyn Host,
    node: NodeId,
    prev: &Props,
    next: &Props,
) -> Result<(), HostError> {
    for (key, value) in prev.attributes() {
        let Some(kind) = event_kind(key) else {
            continue;
        };
        if !next.contains(key) || changed(prev, next, key) {
            if let Some(listener) = value.as_listener() {
                host.remove_event_listener(node, &kind, listener)?;
            }
        }
    }

    for (key, _) in prev.attributes() {
        if !is_event_key(key) && !next.contains(key) {
            host.remove_attribute(node, key)?;
        }
    }

    for (key, value) in next.attributes() {
        if !is_event_key(key) && changed(prev, next, key) {
            host.set_attribute(node, key, value)?;
        }
    }

    for (key, value) in next.attributes() {
        let Some(kind) = event_kind(key) else {
            continue;
        };
        if changed(prev, next, key) {
            if let Some(listener) = listener_of(key, value) {
                host.add_event_listener(node, &kind, listener)?;
            }
        }
    }
    Ok(())
}
