//! Finite algebras over the operation tables.
//!
//! An element of a [`SmallAlg`] is a one-hot vector of `size` literals. A
//! [`ProductAlg`] concatenates the elements of its factors, so its elements
//! are `length = Σ factor lengths` literals long while its universe has
//! `Π factor sizes` elements. Applying an operation never introduces
//! variables besides those of [`OpTable::compose`].

use std::fmt;

use crate::bitvec::BitVec;
use crate::error::{check_shape, Error, Result};
use crate::operation::{Functionality, OpTable, Total};
use crate::sat::Solver;

/// A decoded algebra element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// Element of a small algebra; `None` is the all-false (undefined) value
    Small(Option<usize>),
    /// Element of a product, one entry per factor
    Tuple(Vec<Element>),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Small(Some(value)) => write!(f, "{value}"),
            Element::Small(None) => f.write_str("_"),
            Element::Tuple(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Common interface of small and product algebras.
pub trait Algebra: fmt::Debug {
    /// Number of elements of the universe
    fn size(&self) -> usize;

    /// Number of literals encoding one element
    fn length(&self) -> usize;

    /// Arities of the operations
    fn signature(&self) -> Vec<usize>;

    /// Apply operation `op` to encoded elements
    fn apply(&self, op: usize, args: &[BitVec]) -> Result<BitVec>;

    /// Constant encoding of a host element
    fn encode_elem(&self, elem: &Element) -> Result<BitVec>;

    /// Host element of an encoded element, read from the current model
    fn decode_elem(&self, elem: &BitVec) -> Result<Element>;

    /// Constant copy fixed to the current model
    fn solution(&self) -> Result<Box<dyn Algebra>>;
}

fn check_args(algebra: &dyn Algebra, op: usize, args: &[BitVec]) -> Result<()> {
    let signature = algebra.signature();
    let Some(&arity) = signature.get(op) else {
        return Err(Error::Shape(format!(
            "operation {op} of a signature with {} operations",
            signature.len()
        )));
    };
    check_shape!(
        args.len() == arity,
        "operation {} of arity {} applied to {} arguments",
        op,
        arity,
        args.len()
    );
    for arg in args {
        check_shape!(
            arg.len() == algebra.length(),
            "element of length {} where {} expected",
            arg.len(),
            algebra.length()
        );
    }
    Ok(())
}

// ============================================================================
// SMALL ALGEBRA
// ============================================================================

/// An algebra given by operation tables over `0..size`.
#[derive(Clone, Debug, PartialEq)]
pub struct SmallAlg<F: Functionality = Total> {
    size: usize,
    operations: Vec<OpTable<F>>,
}

impl<F: Functionality> SmallAlg<F> {
    pub fn new(size: usize, operations: Vec<OpTable<F>>) -> Result<Self> {
        check_shape!(size >= 1, "universe size must be positive");
        for op in &operations {
            check_shape!(
                op.size() == size,
                "operation over size {} in an algebra over size {}",
                op.size(),
                size
            );
        }
        Ok(Self { size, operations })
    }

    /// Fresh operations of the given arities
    pub fn variable(solver: &Solver, size: usize, signature: &[usize]) -> Result<Self> {
        let operations = signature
            .iter()
            .map(|&arity| OpTable::variable(solver, size, arity))
            .collect::<Result<Vec<_>>>()?;
        Self::new(size, operations)
    }

    pub fn operations(&self) -> &[OpTable<F>] {
        &self.operations
    }

    pub fn operation(&self, op: usize) -> Option<&OpTable<F>> {
        self.operations.get(op)
    }
}

impl<F: Functionality> Algebra for SmallAlg<F> {
    fn size(&self) -> usize {
        self.size
    }

    fn length(&self) -> usize {
        self.size
    }

    fn signature(&self) -> Vec<usize> {
        self.operations.iter().map(OpTable::arity).collect()
    }

    fn apply(&self, op: usize, args: &[BitVec]) -> Result<BitVec> {
        check_args(self, op, args)?;
        let operation = &self.operations[op];
        if operation.arity() == 0 {
            return Ok(operation.table().clone());
        }
        let elems = args
            .iter()
            .map(|arg| OpTable::from_table(self.size, 0, arg.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(operation.compose(&elems)?.table().clone())
    }

    fn encode_elem(&self, elem: &Element) -> Result<BitVec> {
        match elem {
            Element::Small(value) => {
                let mut cells = vec![false; self.size];
                if let Some(value) = *value {
                    check_shape!(
                        value < self.size,
                        "element {} out of range for size {}",
                        value,
                        self.size
                    );
                    cells[value] = true;
                }
                Ok(BitVec::constant(cells))
            }
            Element::Tuple(_) => Err(Error::Shape(
                "tuple element for a small algebra".to_string(),
            )),
        }
    }

    fn decode_elem(&self, elem: &BitVec) -> Result<Element> {
        check_shape!(
            elem.len() == self.size,
            "element of length {} where {} expected",
            elem.len(),
            self.size
        );
        let cells = elem.solution()?.decode()?;
        match cells.iter().filter(|&&c| c).count() {
            0 => Ok(Element::Small(None)),
            1 => Ok(Element::Small(cells.iter().position(|&c| c))),
            count => Err(Error::InvalidBlock { index: 0, count }),
        }
    }

    fn solution(&self) -> Result<Box<dyn Algebra>> {
        let operations = self
            .operations
            .iter()
            .map(OpTable::solution)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Self::new(self.size, operations)?))
    }
}

// ============================================================================
// PRODUCT ALGEBRA
// ============================================================================

/// Direct product of algebras of one signature.
#[derive(Debug)]
pub struct ProductAlg {
    signature: Vec<usize>,
    factors: Vec<Box<dyn Algebra>>,
    size: usize,
}

impl ProductAlg {
    /// Product of at least one factor; the signature is taken from the first
    pub fn new(factors: Vec<Box<dyn Algebra>>) -> Result<Self> {
        let Some(first) = factors.first() else {
            return Err(Error::Shape(
                "product of no factors needs an explicit signature".to_string(),
            ));
        };
        let signature = first.signature();
        Self::with_signature(signature, factors)
    }

    /// Product with an explicit signature (the empty product is allowed)
    pub fn with_signature(signature: Vec<usize>, factors: Vec<Box<dyn Algebra>>) -> Result<Self> {
        for factor in &factors {
            check_shape!(
                factor.signature() == signature,
                "factor of signature {:?} in a product of signature {:?}",
                factor.signature(),
                signature
            );
        }
        let size = factors.iter().try_fold(1usize, |size, factor| {
            size.checked_mul(factor.size()).ok_or_else(|| {
                Error::Shape(format!("product of {} factors is too large", factors.len()))
            })
        })?;
        Ok(Self {
            signature,
            factors,
            size,
        })
    }

    pub fn factors(&self) -> &[Box<dyn Algebra>] {
        &self.factors
    }

    /// Concatenate one element per factor
    pub fn combine(&self, parts: &[BitVec]) -> Result<BitVec> {
        check_shape!(
            parts.len() == self.factors.len(),
            "{} parts for a product of {} factors",
            parts.len(),
            self.factors.len()
        );
        for (part, factor) in parts.iter().zip(&self.factors) {
            check_shape!(
                part.len() == factor.length(),
                "part of length {} where {} expected",
                part.len(),
                factor.length()
            );
        }
        BitVec::concat(parts)
    }

    /// Split an element into per-factor views
    pub fn splitup(&self, elem: &BitVec) -> Result<Vec<BitVec>> {
        check_shape!(
            elem.len() == self.length(),
            "element of length {} where {} expected",
            elem.len(),
            self.length()
        );
        let mut start = 0;
        let mut parts = Vec::with_capacity(self.factors.len());
        for factor in &self.factors {
            parts.push(elem.slice(start..start + factor.length())?);
            start += factor.length();
        }
        Ok(parts)
    }
}

impl Algebra for ProductAlg {
    fn size(&self) -> usize {
        self.size
    }

    fn length(&self) -> usize {
        self.factors.iter().map(|factor| factor.length()).sum()
    }

    fn signature(&self) -> Vec<usize> {
        self.signature.clone()
    }

    fn apply(&self, op: usize, args: &[BitVec]) -> Result<BitVec> {
        check_args(self, op, args)?;
        let split = args
            .iter()
            .map(|arg| self.splitup(arg))
            .collect::<Result<Vec<_>>>()?;
        let mut parts = Vec::with_capacity(self.factors.len());
        for (i, factor) in self.factors.iter().enumerate() {
            let subargs: Vec<BitVec> = split.iter().map(|arg| arg[i].clone()).collect();
            parts.push(factor.apply(op, &subargs)?);
        }
        self.combine(&parts)
    }

    fn encode_elem(&self, elem: &Element) -> Result<BitVec> {
        match elem {
            Element::Tuple(parts) => {
                check_shape!(
                    parts.len() == self.factors.len(),
                    "tuple of {} entries for a product of {} factors",
                    parts.len(),
                    self.factors.len()
                );
                let encoded = parts
                    .iter()
                    .zip(&self.factors)
                    .map(|(part, factor)| factor.encode_elem(part))
                    .collect::<Result<Vec<_>>>()?;
                self.combine(&encoded)
            }
            Element::Small(_) => Err(Error::Shape(
                "small element for a product algebra".to_string(),
            )),
        }
    }

    fn decode_elem(&self, elem: &BitVec) -> Result<Element> {
        let parts = self
            .splitup(elem)?
            .iter()
            .zip(&self.factors)
            .map(|(part, factor)| factor.decode_elem(part))
            .collect::<Result<Vec<_>>>()?;
        Ok(Element::Tuple(parts))
    }

    fn solution(&self) -> Result<Box<dyn Algebra>> {
        let factors = self
            .factors
            .iter()
            .map(|factor| factor.solution())
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Self::with_signature(self.signature.clone(), factors)?))
    }
}
