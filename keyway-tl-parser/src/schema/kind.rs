/// Whether a [`super::TypeSchema`] is a data constructor or an RPC function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A data constructor (the part of a listing before `--functions--`).
    #[default]
    Constructor,
    /// An RPC function (after `--functions--`).
    Function,
}
