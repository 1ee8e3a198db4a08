//! Symbol classification.
//!
//! Only symbols that are both defined in a section and external take part.
//! Names are matched on raw substrings:
//!
//! - `_OBJC_CLASS` → Objective-C class, with `_OBJC_CLASS_$` removed
//! - `_OBJC_IVAR` → instance variable, with `_OBJC_IVAR_$` removed
//! - `_OBJC_METACLASS` → dropped
//! - anything else → exported symbol, or weak symbol if the policy says so

use crate::macho::SymbolEntry;

const OBJC_CLASS: &str = "_OBJC_CLASS";
const OBJC_CLASS_PREFIX: &str = "_OBJC_CLASS_$";
const OBJC_IVAR: &str = "_OBJC_IVAR";
const OBJC_IVAR_PREFIX: &str = "_OBJC_IVAR_$";
const OBJC_METACLASS: &str = "_OBJC_METACLASS";

/// Decides which plain exported symbols are listed as weak.
pub trait WeakSymbolPolicy {
    /// Returns true if the symbol belongs in the weak list.
    fn is_weak(&self, symbol: &SymbolEntry) -> bool;
}

/// Lists no symbol as weak.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeakSymbols;

impl WeakSymbolPolicy for NoWeakSymbols {
    #[inline]
    fn is_weak(&self, _symbol: &SymbolEntry) -> bool {
        false
    }
}

/// What a symbol turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolClass {
    /// Objective-C class (prefix removed)
    Class(String),
    /// Objective-C instance variable (prefix removed)
    Ivar(String),
    /// Objective-C metaclass, never emitted
    Metaclass,
    /// Plain exported symbol
    Exported(String),
    /// Weak symbol
    Weak(String),
    /// Local, undefined, absolute or unnamed symbol
    Ignored,
}

/// Symbol lists of one slice, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedSymbols {
    /// Exported symbols
    pub symbols: Vec<String>,
    /// Objective-C classes
    pub classes: Vec<String>,
    /// Objective-C instance variables
    pub ivars: Vec<String>,
    /// Weak symbols
    pub weak: Vec<String>,
}

/// Partitions a symbol table into the tbd export lists.
#[derive(Debug, Clone, Default)]
pub struct SymbolClassifier<P = NoWeakSymbols> {
    policy: P,
}

impl SymbolClassifier<NoWeakSymbols> {
    /// Creates a classifier that never reports weak symbols.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: WeakSymbolPolicy> SymbolClassifier<P> {
    /// Creates a classifier with a custom weak-symbol policy.
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    /// Classifies a single symbol.
    pub fn classify(&self, symbol: &SymbolEntry) -> SymbolClass {
        if !(symbol.is_defined() && symbol.is_external()) || symbol.name.is_empty() {
            return SymbolClass::Ignored;
        }

        let name = symbol.name.as_str();
        if name.contains(OBJC_CLASS) {
            SymbolClass::Class(name.replace(OBJC_CLASS_PREFIX, ""))
        } else if name.contains(OBJC_IVAR) {
            SymbolClass::Ivar(name.replace(OBJC_IVAR_PREFIX, ""))
        } else if name.contains(OBJC_METACLASS) {
            SymbolClass::Metaclass
        } else if self.policy.is_weak(symbol) {
            SymbolClass::Weak(name.to_string())
        } else {
            SymbolClass::Exported(name.to_string())
        }
    }

    /// Classifies a whole symbol table and sorts each list.
    pub fn classify_all<'s, I>(&self, symbols: I) -> ClassifiedSymbols
    where
        I: IntoIterator<Item = &'s SymbolEntry>,
    {
        let mut out = ClassifiedSymbols::default();
        for symbol in symbols {
            match self.classify(symbol) {
                SymbolClass::Class(name) => out.classes.push(name),
                SymbolClass::Ivar(name) => out.ivars.push(name),
                SymbolClass::Exported(name) => out.symbols.push(name),
                SymbolClass::Weak(name) => out.weak.push(name),
                SymbolClass::Metaclass | SymbolClass::Ignored => {}
            }
        }

        out.symbols.sort();
        out.classes.sort();
        out.ivars.sort();
        out.weak.sort();
        out
    }
}

/// Orders re-export paths longest first; equal lengths keep their order.
pub fn sort_reexports(reexports: &mut [String]) {
    reexports.sort_by(|a, b| b.len().cmp(&a.len()));
}
