//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Every storage backend and notifier module provides a `Registry` struct
/// implementing this trait, so the binary can wire it up by the name used in
/// the configuration file (e.g. `storage.implementations.memory` or
/// `notifications.implementations.webhook`).
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
