pub use enclose::*;

/// Builds a [`FunctionModifier`](crate::FunctionModifier) for elements of
/// type `$E` from a body.
///
/// ```ignore
/// let count = Var::new(0u64);
/// let on_click: FunctionModifier<Element, String> =
///     modifier!(Element; (count) cx, element, positional, named => {
///         element.listen(count.get(cx).to_string());
///         Ok(None)
///     });
/// ```
#[macro_export]
macro_rules! modifier {
    ($E:ty; ( $($d_tt:tt)* ) $cx:ident, $el:ident, $pos:ident, $named:ident => $($b:tt)*) => {
        $crate::FunctionModifier::<$E, _>::new($crate::macros::enclose!(($( $d_tt )*) move |$cx: &$crate::Evaluation, $el: &$E, $pos, $named| { $($b)* }))
    };
    ($E:ty; $cx:ident, $el:ident, $pos:ident, $named:ident => $($b:tt)*) => {
        $crate::FunctionModifier::<$E, _>::new(move |$cx: &$crate::Evaluation, $el: &$E, $pos, $named| { $($b)* })
    };
}
