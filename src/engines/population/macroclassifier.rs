use super::classifier::Classifier;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// A classifier standing for `numerosity` identical micro-classifiers.
///
/// The classifier is shared: match sets and correct sets hold clones of the
/// macroclassifier that point at the same rule as the population.
#[derive(Debug, Serialize, Deserialize)]
pub struct Macroclassifier<D> {
    pub classifier: Rc<RefCell<Classifier<D>>>,
    pub numerosity: usize,
    pub subsumptions: usize,
}

impl<D> Macroclassifier<D> {
    pub fn new(classifier: Classifier<D>, numerosity: usize) -> Self {
        debug_assert!(numerosity >= 1);
        Self {
            classifier: Rc::new(RefCell::new(classifier)),
            numerosity,
            subsumptions: 0,
        }
    }

    pub fn borrow(&self) -> Ref<'_, Classifier<D>> {
        self.classifier.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Classifier<D>> {
        self.classifier.borrow_mut()
    }

    pub fn serial(&self) -> u64 {
        self.classifier.borrow().serial()
    }

}

impl<D> Clone for Macroclassifier<D> {
    fn clone(&self) -> Self {
        Self {
            classifier: Rc::clone(&self.classifier),
            numerosity: self.numerosity,
            subsumptions: self.subsumptions,
        }
    }
}
