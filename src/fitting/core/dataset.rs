//! Dataset — ordered, column-wise event storage over a fixed Observable set.
//!
//! Purpose
//! -------
//! Hold the events an unbinned fit runs over. Storage is one `Vec<f64>` per
//! Observable (structure of arrays), which keeps per-event likelihood sums
//! cache friendly and makes chunked parallel reduction trivial.
//!
//! Invariants
//! ----------
//! - All columns have the same length.
//! - Every stored value is finite and inside its Observable's `[lower, upper]`.
//! - Both ingestion paths ([`Dataset::add_event`] and
//!   [`Dataset::from_matrix`]) enforce the same invariant; a failed ingestion
//!   leaves the dataset unchanged.
//! - Observables are matched by handle identity, never by a name lookup in
//!   some global table.
use ndarray::ArrayView2;

use crate::fitting::{
    core::observable::Observable,
    errors::{ModelError, ModelResult},
};

#[derive(Debug, Clone)]
pub struct Dataset {
    observables: Vec<Observable>,
    columns: Vec<Vec<f64>>,
}

/// Borrowed view of one event.
#[derive(Debug, Clone, Copy)]
pub struct DataPoint<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> DataPoint<'a> {
    /// Position of this event in the dataset.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Coordinate for the Observable called `name`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.dataset
            .observables
            .iter()
            .position(|o| o.name() == name)
            .map(|k| self.dataset.columns[k][self.index])
    }

    /// Coordinate for a specific Observable handle.
    pub fn get(&self, observable: &Observable) -> Option<f64> {
        self.dataset.index_of(observable).map(|k| self.dataset.columns[k][self.index])
    }

    /// `(name, value)` pairs in Observable order.
    pub fn iter(self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let index = self.index;
        self.dataset
            .observables
            .iter()
            .zip(self.dataset.columns.iter())
            .map(move |(o, col)| (o.name(), col[index]))
    }
}

impl Dataset {
    /// Create an empty dataset over `observables`.
    ///
    /// # Errors
    /// - [`ModelError::NoObservables`] for an empty slice.
    /// - [`ModelError::DuplicateObservable`] if two entries share a name (or
    ///   are the same handle).
    pub fn new(observables: &[Observable]) -> ModelResult<Self> {
        if observables.is_empty() {
            return Err(ModelError::NoObservables);
        }
        for (i, obs) in observables.iter().enumerate() {
            if observables[..i].iter().any(|o| o.name() == obs.name()) {
                return Err(ModelError::DuplicateObservable { name: obs.name().to_string() });
            }
        }
        Ok(Self {
            observables: observables.to_vec(),
            columns: vec![Vec::new(); observables.len()],
        })
    }

    pub fn observables(&self) -> &[Observable] {
        &self.observables
    }

    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column position of `observable` (by identity).
    pub fn index_of(&self, observable: &Observable) -> Option<usize> {
        self.observables.iter().position(|o| o.same(observable))
    }

    /// Column of the Observable called `name`.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.observables.iter().position(|o| o.name() == name).map(|k| self.columns[k].as_slice())
    }

    /// Column of a specific Observable handle.
    pub fn column_of(&self, observable: &Observable) -> Option<&[f64]> {
        self.index_of(observable).map(|k| self.columns[k].as_slice())
    }

    pub fn point(&self, index: usize) -> Option<DataPoint<'_>> {
        (index < self.len()).then_some(DataPoint { dataset: self, index })
    }

    pub fn points(&self) -> impl Iterator<Item = DataPoint<'_>> + '_ {
        (0..self.len()).map(move |index| DataPoint { dataset: self, index })
    }

    /// Append one event built from each Observable's current value.
    ///
    /// # Errors
    /// [`ModelError::OutOfDomain`] if any current value is non-finite or
    /// outside its bounds; nothing is appended in that case.
    pub fn add_event(&mut self) -> ModelResult<()> {
        let values = self.current_values();
        self.check_event(&values, self.len())?;
        self.push_event(&values);
        Ok(())
    }

    /// Like [`add_event`](Self::add_event) but skips out-of-domain events.
    ///
    /// Returns `true` if the event was stored.
    pub fn add_event_filtered(&mut self) -> bool {
        let values = self.current_values();
        if self.check_event(&values, self.len()).is_err() {
            return false;
        }
        self.push_event(&values);
        true
    }

    /// Bulk import: one row per Observable, one column per event.
    ///
    /// With `filter = true`, events with any coordinate outside its bounds
    /// (or non-finite) are dropped. With `filter = false`, the first such
    /// coordinate aborts the import and nothing is appended. Surviving events
    /// keep their input order and are appended after existing events.
    ///
    /// Returns the number of events appended.
    ///
    /// # Errors
    /// - [`ModelError::ShapeMismatch`] if the row count differs from the
    ///   number of Observables.
    /// - [`ModelError::OutOfDomain`] (only with `filter = false`).
    pub fn from_matrix(&mut self, rows: ArrayView2<'_, f64>, filter: bool) -> ModelResult<usize> {
        if rows.nrows() != self.observables.len() {
            return Err(ModelError::ShapeMismatch {
                expected_rows: self.observables.len(),
                actual_rows: rows.nrows(),
            });
        }
        let mut keep = Vec::with_capacity(rows.ncols());
        let mut event_values = Vec::with_capacity(rows.nrows());
        for (event, col) in rows.columns().into_iter().enumerate() {
            event_values.clear();
            event_values.extend(col.iter().copied());
            match self.check_event(&event_values, event) {
                Ok(()) => keep.push(event),
                Err(err) if !filter => return Err(err),
                Err(_) => {}
            }
        }
        for (k, column) in self.columns.iter_mut().enumerate() {
            let row = rows.row(k);
            column.reserve(keep.len());
            column.extend(keep.iter().map(|&event| row[event]));
        }
        Ok(keep.len())
    }

    // ---- Helper methods ----

    fn current_values(&self) -> Vec<f64> {
        self.observables.iter().map(Observable::value).collect()
    }

    fn check_event(&self, values: &[f64], event: usize) -> ModelResult<()> {
        for (obs, &value) in self.observables.iter().zip(values) {
            if !obs.contains(value) {
                return Err(ModelError::OutOfDomain {
                    observable: obs.name().to_string(),
                    event,
                    value,
                    lower: obs.lower(),
                    upper: obs.upper(),
                });
            }
        }
        Ok(())
    }

    fn push_event(&mut self, values: &[f64]) {
        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::errors::ErrorKind;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction rules.
    // - Filtering and atomicity of `from_matrix`.
    // - Single-event appends and row views.
    //
    // They intentionally DO NOT cover:
    // - Equivalence of both ingestion paths on random data (see `tests/`).
    // -------------------------------------------------------------------------

    fn xy() -> (Observable, Observable) {
        (
            Observable::new("x", 0.0, 10.0).expect("valid observable"),
            Observable::new("y", -1.0, 1.0).expect("valid observable"),
        )
    }

    #[test]
    // Purpose
    // -------
    // Empty and duplicated observable lists are rejected.
    //
    // Given
    // -----
    // - `[]` and `[x, x]`.
    //
    // Expect
    // ------
    // - `NoObservables` and `DuplicateObservable`.
    fn new_rejects_empty_and_duplicate_observables() {
        // Arrange
        let (x, _) = xy();

        // Act / Assert
        assert_eq!(Dataset::new(&[]).expect_err("empty").kind(), ErrorKind::Validation);
        assert!(matches!(
            Dataset::new(&[x.clone(), x]),
            Err(ModelError::DuplicateObservable { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Filtering keeps in-domain columns in their input order.
    //
    // Given
    // -----
    // - Four events over (x, y); event 1 has x = 12 and event 3 has y = NaN.
    //
    // Expect
    // ------
    // - Two events kept: (1, 0.5) then (9, -1).
    fn from_matrix_filter_keeps_in_domain_columns_in_order() {
        // Arrange
        let (x, y) = xy();
        let mut data = Dataset::new(&[x.clone(), y.clone()]).expect("valid dataset");
        let m = array![[1.0, 12.0, 9.0, 2.0], [0.5, 0.0, -1.0, f64::NAN]];

        // Act
        let kept = data.from_matrix(m.view(), true).expect("filtered import never fails");

        // Assert
        assert_eq!(kept, 2);
        assert_eq!(data.column_of(&x), Some(&[1.0, 9.0][..]));
        assert_eq!(data.column("y"), Some(&[0.5, -1.0][..]));
    }

    #[test]
    // Purpose
    // -------
    // An unfiltered import with a violation fails and leaves the dataset as it was.
    //
    // Given
    // -----
    // - A dataset holding one event, then a matrix whose third event is out of bounds.
    //
    // Expect
    // ------
    // - `OutOfDomain { event: 2, .. }` and still exactly one event.
    fn from_matrix_unfiltered_is_atomic() {
        // Arrange
        let (x, _) = xy();
        let mut data = Dataset::new(&[x.clone()]).expect("valid dataset");
        x.set_value(3.0);
        data.add_event().expect("in domain");
        let m = array![[1.0, 2.0, -0.5, 4.0]];

        // Act
        let err = data.from_matrix(m.view(), false).expect_err("must fail");

        // Assert
        assert!(matches!(err, ModelError::OutOfDomain { event: 2, .. }));
        assert_eq!(data.len(), 1);
        assert_eq!(data.column("x"), Some(&[3.0][..]));
    }

    #[test]
    // Purpose
    // -------
    // Wrong row count is a validation error.
    //
    // Given
    // -----
    // - A two-observable dataset and a one-row matrix.
    //
    // Expect
    // ------
    // - `ShapeMismatch { expected_rows: 2, actual_rows: 1 }`.
    fn from_matrix_rejects_wrong_row_count() {
        // Arrange
        let (x, y) = xy();
        let mut data = Dataset::new(&[x, y]).expect("valid dataset");

        // Act
        let err = data.from_matrix(array![[1.0, 2.0]].view(), true).expect_err("shape");

        // Assert
        assert_eq!(err, ModelError::ShapeMismatch { expected_rows: 2, actual_rows: 1 });
    }

    #[test]
    // Purpose
    // -------
    // `add_event` snapshots current values; out-of-domain values are refused.
    //
    // Given
    // -----
    // - x = 2, y = 0.25 (ok), then y = 3 (out of domain).
    //
    // Expect
    // ------
    // - One stored point readable by name; `add_event` errors and
    //   `add_event_filtered` returns `false` for the bad event.
    fn add_event_snapshots_values_and_enforces_bounds() {
        // Arrange
        let (x, y) = xy();
        let mut data = Dataset::new(&[x.clone(), y.clone()]).expect("valid dataset");
        x.set_value(2.0);
        y.set_value(0.25);

        // Act
        data.add_event().expect("in domain");
        y.set_value(3.0);
        let strict = data.add_event();
        let lenient = data.add_event_filtered();

        // Assert
        assert!(matches!(strict, Err(ModelError::OutOfDomain { event: 1, .. })));
        assert!(!lenient);
        assert_eq!(data.len(), 1);
        let p = data.point(0).expect("one point");
        assert_eq!(p.value("x"), Some(2.0));
        assert_eq!(p.get(&y), Some(0.25));
        assert_eq!(p.iter().collect::<Vec<_>>(), vec![("x", 2.0), ("y", 0.25)]);
        assert!(data.point(1).is_none());
    }
}
