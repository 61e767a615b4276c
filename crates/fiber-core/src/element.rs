//! Immutable element descriptors.
//!
//! An [`Element`] names what should exist at one position of the tree: a
//! host tag, a text run, or a component function, together with its
//! [`Props`]. Descriptors are built fresh for every render and never mutated;
//! the reconciler compares them against the fibers of the previous commit.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::host::NodeId;

/// Attribute carrying the content of a text node.
pub const TEXT_VALUE: &str = "nodeValue";

/// Attribute keys starting with this prefix are event listeners.
pub const EVENT_PREFIX: &str = "on";

/// Signature of a component: props in, exactly one descriptor out.
pub type ComponentFn = fn(&Props) -> Element;

/// A named component function.
///
/// Two components are the same type when both the name and the function
/// address match.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: ComponentFn,
}

impl Component {
    pub const fn new(name: &'static str, render: ComponentFn) -> Self {
        Self { name, render }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, props: &Props) -> Element {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.render as usize == other.render as usize
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// What a descriptor (and the fiber built from it) stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    Host(String),
    Text,
    Component(Component),
}

impl ElementType {
    pub fn host(tag: impl Into<String>) -> Self {
        Self::Host(tag.into())
    }

    #[inline]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Host(tag) => Some(tag),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => write!(f, "<{tag}>"),
            Self::Text => f.write_str("#text"),
            Self::Component(component) => f.write_str(component.name),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        Self::host(tag)
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        Self::Host(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        Self::Component(component)
    }
}

/// Event delivered to a [`Listener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: String,
    pub target: NodeId,
}

/// Event handler attached through an `on*` attribute.
///
/// Equality is handler identity: a listener is only considered unchanged
/// across renders when the very same closure is passed again.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Listener(Listener),
}

impl PropValue {
    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    /// Renders a plain value the way a host stores it; listeners have no
    /// attribute form.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Str(value) => Some(value.clone()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Listener(_) => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Listener> for PropValue {
    fn from(listener: Listener) -> Self {
        Self::Listener(listener)
    }
}

/// Returns true when `key` names an event listener (`onClick`, `oninput`).
/// Any `on` prefix counts, including a bare `on`.
pub fn is_event_key(key: &str) -> bool {
    key.starts_with(EVENT_PREFIX)
}

/// Maps a listener key to the host event kind: `onClick` becomes `click`,
/// a bare `on` the empty kind.
pub fn event_kind(key: &str) -> Option<String> {
    is_event_key(key).then(|| key[EVENT_PREFIX.len()..].to_lowercase())
}

/// Attributes and children of a descriptor.
///
/// Children live beside the attribute map rather than inside it, so they can
/// never be patched onto a host node as an attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attributes: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds a listener under `key`, which should carry the `on` prefix.
    pub fn on(self, key: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.with(key, Listener::new(handler))
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children_from<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.attributes.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Compares attributes and listeners, ignoring children.
    pub fn same_attributes(&self, other: &Props) -> bool {
        self.attributes == other.attributes
    }
}

/// An immutable descriptor. Cloning shares the props.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub fn new(ty: impl Into<ElementType>, props: Props) -> Self {
        Self {
            ty: ty.into(),
            props: Rc::new(props),
        }
    }

    pub fn component(component: Component, props: Props) -> Self {
        Self::new(component, props)
    }

    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }
}

/// Builds a host or component descriptor.
pub fn create_element(ty: impl Into<ElementType>, props: Props) -> Element {
    Element::new(ty, props)
}

/// Builds a text descriptor: the text marker type, a `nodeValue`
/// attribute, and no children.
pub fn create_text_element(text: impl Into<String>) -> Element {
    Element::new(ElementType::Text, Props::new().with(TEXT_VALUE, text.into()))
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        create_text_element(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        create_text_element(text)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        create_text_element(value.to_string())
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        create_text_element(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(_props: &Props) -> Element {
        create_element("div", Props::new())
    }

    fn second(_props: &Props) -> Element {
        create_element("span", Props::new())
    }

    #[test]
    fn primitive_children_become_text_elements() {
        let element = create_element("h1", Props::new().child("Count: ").child(1));
        let children = element.props().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].ty(), &ElementType::Text);
        assert_eq!(
            children[1].props().get(TEXT_VALUE),
            Some(&PropValue::Str("1".into()))
        );
        assert!(children[1].props().children().is_empty());
    }

    #[test]
    fn components_compare_by_name_and_function() {
        let a = Component::new("First", first);
        assert_eq!(ElementType::from(a), ElementType::from(Component::new("First", first)));
        assert_ne!(a, Component::new("Second", second));
        assert_ne!(ElementType::from(a), ElementType::host("div"));
    }

    #[test]
    fn listeners_compare_by_identity() {
        let listener = Listener::new(|_| {});
        assert_eq!(listener, listener.clone());
        assert_ne!(listener, Listener::new(|_| {}));
    }

    #[test]
    fn event_keys_map_to_lowercase_kinds() {
        assert_eq!(event_kind("onClick").as_deref(), Some("click"));
        assert_eq!(event_kind("on").as_deref(), Some(""));
        assert_eq!(event_kind("id"), None);
        assert!(is_event_key("on"));
        assert!(!is_event_key("o"));
    }
}
