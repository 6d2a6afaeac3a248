//! Declarative helpers for binding implementations.

/// Declares which implementations can satisfy a trait-object identity.
///
/// Generates an [`Implements<dyn Trait>`](crate::Implements) upcast for each
/// listed type, so the type can be registered under `dyn Trait`.
///
/// # Examples
///
/// ```
/// use autowire::{Arguments, Container, DiResult, Injectable};
///
/// trait Store: Send + Sync {
///     fn name(&self) -> &'static str;
/// }
///
/// struct Memory;
/// impl Store for Memory { fn name(&self) -> &'static str { "memory" } }
/// impl Injectable for Memory {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Memory) }
/// }
///
/// struct Disk;
/// impl Store for Disk { fn name(&self) -> &'static str { "disk" } }
/// impl Injectable for Disk {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Disk) }
/// }
///
/// autowire::interface!(dyn Store = [Memory, Disk]);
///
/// let container = Container::new();
/// container.add_singleton::<dyn Store, Disk>();
/// assert_eq!(container.resolve::<dyn Store>().unwrap().name(), "disk");
/// ```
#[macro_export]
macro_rules! interface {
    (dyn $trait:path = [$($implementation:ty),+ $(,)?]) => {
        $(
            impl $crate::Implements<dyn $trait> for $implementation {
                fn upcast(this: ::std::sync::Arc<Self>) -> ::std::sync::Arc<dyn $trait> {
                    this
                }
            }
        )+
    };
}

/// Marks a type for auto-registration, optionally with a lifetime
/// (default [`Lifetime::Singleton`](crate::Lifetime::Singleton)).
///
/// The marker is recorded together with the current `module_path!()`; see
/// [`Namespace::discover`](crate::Namespace::discover).
///
/// ```ignore
/// autowire::injectable!(Clock);
/// autowire::injectable!(RequestId, Lifetime::Transient);
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty) => {
        $crate::injectable!($ty, $crate::Lifetime::Singleton);
    };
    ($ty:ty, $lifetime:expr) => {
        $crate::inventory::submit! {
            $crate::InjectableEntry::new::<$ty>(
                ::core::module_path!(),
                ::core::stringify!($ty),
                $lifetime,
            )
        }
    };
}
