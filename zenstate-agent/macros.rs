//! Declarative macros to reduce boilerplate across the zenstate codebase

/// Define a fieldless enum with automatic `name()`, `all()` and `Display`
///
/// # Example
/// ```
/// use zenstate::named_enum;
///
/// named_enum! {
///     pub enum Level {
///         Package => "package",
///         Core => "core",
///     }
/// }
///
/// assert_eq!(Level::Core.name(), "core");
/// assert_eq!(Level::Package.to_string(), "package");
/// assert_eq!(Level::all().len(), 2);
/// ```
///
/// Expands to:
/// - An enum with Debug, Clone, Copy, PartialEq, Eq, Hash derives
/// - A `name(&self) -> &'static str` method
/// - An `all() -> Vec<Self>` method
/// - A `Display` impl printing `name()`
#[macro_export]
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}
