//! Rule cascades for scalar statement fields.
//!
//! Every cascade is an ordered table; the first rule that yields an accepted
//! value wins and the rule's label travels with the value so reports can
//! show how each field was found.

pub mod balance;
pub mod cnpj;
pub mod currency;
pub mod doctype;
pub mod identifier;
pub mod modality;
pub mod patterns;

pub use balance::{resolve_balance, BalanceResolver, BalanceRule};
pub use cnpj::{cnpj_digits, format_cnpj};
pub use currency::{format_brl, parse_brl};
pub use doctype::{classify_document, is_itemized_report, DocumentType};
pub use identifier::{resolve_identifier, resolve_identifier_composite, IdentifierResolver};
pub use modality::{resolve_modality, ModalityResolver, ModalitySource};
pub use patterns::*;

/// Label used when no rule of a cascade produced a value.
pub const NOT_FOUND: &str = "Não encontrado";

/// Trait for field resolvers. Resolution always succeeds, falling back to a
/// sentinel value labelled [`NOT_FOUND`] or similar.
pub trait FieldResolver {
    /// The type of value this resolver produces.
    type Output;

    /// Resolve the field from document text.
    fn resolve(&self, text: &str) -> Resolved<Self::Output>;
}

/// A resolved value and the label of the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub method: &'static str,
}

impl<T> Resolved<T> {
    pub fn new(value: T, method: &'static str) -> Self {
        Self { value, method }
    }

    pub fn is_found(&self) -> bool {
        self.method != NOT_FOUND
    }
}
