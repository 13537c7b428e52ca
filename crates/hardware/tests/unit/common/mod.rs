//! # Common Type Tests


/// Power status cell and composite agreement.
pub mod power;

/// Register views, condition codes and privilege gates.
pub mod registers;
