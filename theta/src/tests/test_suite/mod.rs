pub(crate) mod generic_enumeration;
pub(crate) mod generic_summation;
