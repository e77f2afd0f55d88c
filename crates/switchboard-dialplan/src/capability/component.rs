//! Call-context-aware components instantiable from context bodies.
//!
//! Components are registered by class name (`Voicemail`, `CallerId`) with a
//! factory. Dialplans reach a class either through its pre-bound name
//! (`Voicemail.new("100")`) or through the generated constructor capability
//! (`new_voicemail("100")`). Both paths hand the running call to the factory.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::call::Call;
use crate::error::{CommandError, ComponentError, ExecutionError};
use crate::value::Value;

/// A component instance bound to one call.
pub trait Component: Send {
    /// Handles `instance.method(args)` from a context body.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the method is unsupported or fails.
    fn invoke(&mut self, method: &str, args: &[Value]) -> Result<Value, CommandError>;
}

/// Builds a component instance for the running call.
pub type ComponentFactory =
    Arc<dyn Fn(&Arc<Call>, &[Value]) -> Result<Box<dyn Component>, CommandError> + Send + Sync>;

/// Returns the constructor capability name for a component class.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::constructor_name;
///
/// assert_eq!(constructor_name("Voicemail"), "new_voicemail");
/// assert_eq!(constructor_name("CallerIdLookup"), "new_caller_id_lookup");
/// assert_eq!(constructor_name("HTTPNotifier"), "new_http_notifier");
/// ```
#[must_use]
pub fn constructor_name(class: &str) -> String {
    format!("new_{}", snake_case(class))
}

fn snake_case(class: &str) -> String {
    let chars: Vec<char> = class.chars().collect();
    let mut snake = String::with_capacity(class.len() + 4);
    for (index, ch) in chars.iter().copied().enumerate() {
        if ch.is_ascii_uppercase() && index > 0 {
            let previous = chars.get(index - 1).copied().unwrap_or('_');
            let next = chars.get(index + 1).copied().unwrap_or('_');
            let starts_word = previous.is_ascii_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_ascii_uppercase() && next.is_ascii_lowercase());
            if starts_word {
                snake.push('_');
            }
        }
        snake.push(ch.to_ascii_lowercase());
    }
    snake
}

fn is_class_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|first| first.is_ascii_uppercase())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Registry of component classes and their factories.
///
/// # Example
///
/// ```
/// use switchboard_dialplan::{Component, CommandError, ComponentRegistry, Value};
///
/// struct Voicemail;
///
/// impl Component for Voicemail {
///     fn invoke(&mut self, _method: &str, _args: &[Value]) -> Result<Value, CommandError> {
///         Ok(Value::Nil)
///     }
/// }
///
/// let mut components = ComponentRegistry::new();
/// components
///     .register("Voicemail", |_call, _args| Ok(Box::new(Voicemail) as Box<dyn Component>))
///     .expect("registration succeeds");
/// assert!(components.contains("Voicemail"));
/// ```
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component class.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidName`] unless `class` is a capitalised
    /// identifier, and [`ComponentError::Duplicate`] if the class is already
    /// registered.
    pub fn register<F>(
        &mut self,
        class: impl Into<String>,
        factory: F,
    ) -> Result<(), ComponentError>
    where
        F: Fn(&Arc<Call>, &[Value]) -> Result<Box<dyn Component>, CommandError>
            + Send
            + Sync
            + 'static,
    {
        let name = class.into();
        if !is_class_name(&name) {
            return Err(ComponentError::InvalidName { name });
        }
        if self.factories.contains_key(&name) {
            return Err(ComponentError::Duplicate { name });
        }
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Returns `true` when `class` is registered.
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Class names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub(crate) fn instantiate(
        &self,
        class: &str,
        call: &Arc<Call>,
        args: &[Value],
    ) -> Result<ComponentHandle, ExecutionError> {
        let constructor = constructor_name(class);
        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| ExecutionError::unknown_capability(&constructor))?;
        let instance =
            factory(call, args).map_err(|source| ExecutionError::command(constructor, source))?;
        Ok(ComponentHandle::new(class, instance))
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_set()
            .entries(self.factories.keys())
            .finish()
    }
}

/// Shared handle to a live component instance.
#[derive(Clone)]
pub struct ComponentHandle {
    class: Arc<str>,
    instance: Arc<Mutex<Box<dyn Component>>>,
}

impl ComponentHandle {
    fn new(class: &str, instance: Box<dyn Component>) -> Self {
        Self {
            class: Arc::from(class),
            instance: Arc::new(Mutex::new(instance)),
        }
    }

    /// Class the instance was created from.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Forwards a method call to the instance.
    ///
    /// # Errors
    ///
    /// Propagates the [`CommandError`] returned by the component.
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, CommandError> {
        self.instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .invoke(method, args)
    }

    /// Returns `true` when both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ComponentHandle")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}
