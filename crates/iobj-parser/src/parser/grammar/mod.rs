pub(crate) mod array;
pub(crate) mod collection;
pub(crate) mod document;
pub(crate) mod member;
pub(crate) mod object;
pub(crate) mod section;
