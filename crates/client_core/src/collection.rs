use std::collections::{hash_map, HashMap};

use shared::domain::Step;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepCollection {
    steps: HashMap<String, Step>,
}

impl StepCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl IntoIterator<Item = Step>) -> Self {
        let mut collection = Self::new();
        for step in steps {
            collection.insert(step);
        }
        collection
    }

    pub fn get(&self, task_id: &str) -> Option<&Step> {
        self.steps.get(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.steps.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> hash_map::Values<'_, String, Step> {
        self.steps.values()
    }

    pub fn insert(&mut self, step: Step) -> Option<Step> {
        self.steps.insert(step.task_id.clone(), step)
    }

    pub fn remove(&mut self, task_id: &str) -> Option<Step> {
        self.steps.remove(task_id)
    }
}

impl FromIterator<Step> for StepCollection {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self::from_steps(iter)
    }
}

impl<'a> IntoIterator for &'a StepCollection {
    type Item = &'a Step;
    type IntoIter = hash_map::Values<'a, String, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
