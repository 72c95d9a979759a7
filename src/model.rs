pub mod entity {
    pub type Id = String;
    pub type Measure = f64;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MeasureKind {
        Output,
        Input,
    }

    impl std::fmt::Display for MeasureKind {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                MeasureKind::Output => f.write_str("output"),
                MeasureKind::Input => f.write_str("input"),
            }
        }
    }

    /// One decision-making unit: an id plus its output and input measurements.
    #[derive(Debug, Clone, PartialEq)]
    pub struct EntityRecord {
        pub id: Id,
        pub outputs: Vec<Measure>,
        pub inputs: Vec<Measure>,
    }

    impl EntityRecord {
        pub fn new(id: impl Into<Id>, outputs: Vec<Measure>, inputs: Vec<Measure>) -> EntityRecord {
            EntityRecord { id: id.into(), outputs, inputs }
        }

        /// A record ranked purely by its outputs.
        pub fn outputs_only(id: impl Into<Id>, outputs: Vec<Measure>) -> EntityRecord {
            EntityRecord::new(id, outputs, Vec::new())
        }

        pub fn measures(&self, kind: MeasureKind) -> &[Measure] {
            match kind {
                MeasureKind::Output => &self.outputs,
                MeasureKind::Input => &self.inputs,
            }
        }
    }
}


pub mod population {
    use std::collections::BTreeMap;
    use super::entity::{Id, EntityRecord};

    /// Records keyed by id. Iteration is always in id order.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Population {
        records: BTreeMap<Id, EntityRecord>,
    }

    impl Population {
        pub fn new() -> Population {
            Population::default()
        }

        /// Inserts a record, returning the one it replaced under the same id.
        pub fn insert(&mut self, record: EntityRecord) -> Option<EntityRecord> {
            self.records.insert(record.id.clone(), record)
        }

        pub fn get(&self, id: &str) -> Option<&EntityRecord> {
            self.records.get(id)
        }

        pub fn contains(&self, id: &str) -> bool {
            self.records.contains_key(id)
        }

        pub fn len(&self) -> usize {
            self.records.len()
        }

        pub fn is_empty(&self) -> bool {
            self.records.is_empty()
        }

        pub fn ids(&self) -> impl Iterator<Item = &Id> {
            self.records.keys()
        }

        pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
            self.records.values()
        }

        /// Local copy of this population with `record` added; `self` is untouched.
        pub fn with_candidate(&self, record: EntityRecord) -> Population {
            let mut augmented = self.clone();
            augmented.insert(record);
            augmented
        }
    }

    impl FromIterator<EntityRecord> for Population {
        fn from_iter<T: IntoIterator<Item = EntityRecord>>(iter: T) -> Self {
            let mut population = Population::new();
            for record in iter {
                population.insert(record);
            }
            population
        }
    }
}

pub mod score {
    use std::collections::BTreeMap;
    use super::entity::Id;

    pub type Score = f64;
    pub type Percentile = f64;

    pub type ScoreMap = BTreeMap<Id, Score>;
    pub type PercentileMap = BTreeMap<Id, Percentile>;
}

#[cfg(test)]
mod tests {
    use super::entity::EntityRecord;
    use super::population::Population;

    #[test]
    fn population_iterates_in_id_order() {
        let population: Population = ["c", "a", "b"]
            .into_iter()
            .map(|id| EntityRecord::outputs_only(id, vec![1.0]))
            .collect();
        let ids: Vec<&str> = population.ids().map(String::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn with_candidate_leaves_original_untouched() {
        let population: Population = vec![
            EntityRecord::outputs_only("0", vec![1.0, 2.0]),
            EntityRecord::outputs_only("1", vec![3.0, 4.0]),
        ].into_iter().collect();
        let before = population.clone();

        let augmented = population.with_candidate(EntityRecord::outputs_only("x", vec![5.0, 6.0]));

        assert_eq!(augmented.len(), 3);
        assert!(augmented.contains("x"));
        assert_eq!(population, before);
    }
}
