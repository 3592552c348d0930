// Section/item mutation: pure list transformations, the editing buffer for
// staged items, advisory validation and the commands tying them to the store.

pub mod editor;
pub mod handlers;
pub mod mutator;
pub mod staging;
pub mod validation;
