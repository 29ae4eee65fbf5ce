//! Entity model: processes, complex elements and the main complex.
//!
//! Processes and complex elements have the same shape, so both are a
//! [`Unit`] tagged with a [`Role`]. The complex owns its elements in a fixed
//! order; only their activity flags ever change.
//!
//! Two values are derived from the elements and never stored:
//!
//! - [`integration_score`]: a placeholder integration metric,
//!   `log2(2^differentiation) * INTEGRATION_FACTOR`.
//! - [`experience_description`]: the textual experience produced by the
//!   currently active elements.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{PhiError, Result};

/// Multiplier applied to the information capacity of the complex.
/// Held at 1.0, which makes the score numerically equal to the element count.
pub const INTEGRATION_FACTOR: f64 = 1.0;

/// Description returned when no element of the complex is active.
pub const NOTHINGNESS_EXPERIENCE: &str =
    "Experience of nothingness: pure awareness without any specific content.";

/// Suffix stripped from element display names when describing an experience.
const NEURONS_SUFFIX: &str = " Neurons";

/// Which part of the system a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Insulated process outside the complex
    Process,
    /// Member of the main complex
    ComplexElement,
}

/// A neural subsystem: either an insulated process or a complex element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    id: String,
    display_name: String,
    description: String,
    role: Role,
    is_active: bool,
    #[serde(skip)]
    default_active: bool,
}

impl Unit {
    pub fn new(
        role: Role,
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        default_active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: description.into(),
            role,
            is_active: default_active,
            default_active,
        }
    }

    pub fn process(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Role::Process, id, display_name, description, false)
    }

    pub fn element(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Role::ComplexElement, id, display_name, description, false)
    }

    /// Mark the unit as active from construction and after every reset.
    pub fn always_on(mut self) -> Self {
        self.default_active = true;
        self.is_active = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn default_active(&self) -> bool {
        self.default_active
    }

    /// Display name with the trailing " Neurons" removed.
    pub fn short_name(&self) -> &str {
        self.display_name
            .strip_suffix(NEURONS_SUFFIX)
            .unwrap_or(&self.display_name)
    }

    pub(crate) fn activate(&mut self) {
        self.is_active = true;
    }

    pub(crate) fn restore_default(&mut self) {
        self.is_active = self.default_active;
    }
}

/// The main complex: the set of elements whose joint state is the experience.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Complex {
    display_name: String,
    description: String,
    is_active: bool,
    elements: Vec<Unit>,
}

impl Complex {
    /// Build a complex. Element ids must be unique.
    pub fn new(
        display_name: impl Into<String>,
        description: impl Into<String>,
        elements: Vec<Unit>,
    ) -> Result<Self> {
        ensure_unique_ids(&elements)?;
        let mut complex = Self {
            display_name: display_name.into(),
            description: description.into(),
            is_active: false,
            elements,
        };
        complex.refresh_activity();
        Ok(complex)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// True while at least one element is active.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn elements(&self) -> &[Unit] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&Unit> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn integration_score(&self) -> f64 {
        integration_score(&self.elements)
    }

    pub fn experience_description(&self) -> String {
        experience_description(&self.elements)
    }

    /// Activate the element with `id`. Returns false if no such element exists.
    pub(crate) fn activate_element(&mut self, id: &str) -> bool {
        let found = match self.elements.iter_mut().find(|e| e.id() == id) {
            Some(element) => {
                element.activate();
                true
            }
            None => false,
        };
        self.refresh_activity();
        found
    }

    pub(crate) fn restore_defaults(&mut self) {
        for element in &mut self.elements {
            element.restore_default();
        }
        self.refresh_activity();
    }

    fn refresh_activity(&mut self) {
        self.is_active = self.elements.iter().any(Unit::is_active);
    }
}

pub(crate) fn ensure_unique_ids(units: &[Unit]) -> Result<()> {
    let mut seen = HashSet::with_capacity(units.len());
    for unit in units {
        if !seen.insert(unit.id()) {
            return Err(PhiError::DuplicateId(unit.id().to_string()));
        }
    }
    Ok(())
}

/// Information capacity of `differentiation` binary elements: `log2(2^d)`.
///
/// Evaluated as `d * log2(2)` so that `2^d` is never materialised; it
/// leaves the f64 range at d = 1024.
pub fn information_capacity(differentiation: usize) -> f64 {
    differentiation as f64 * 2f64.log2()
}

/// Placeholder integration score of the complex.
///
/// Depends only on the number of elements. A complex of zero or one element
/// integrates nothing and scores 0.0.
pub fn integration_score(elements: &[Unit]) -> f64 {
    let differentiation = elements.len();
    if differentiation <= 1 {
        return 0.0;
    }
    information_capacity(differentiation) * INTEGRATION_FACTOR
}

/// Describe the experience produced by the active elements, in sequence order.
pub fn experience_description(elements: &[Unit]) -> String {
    let active: Vec<&Unit> = elements.iter().filter(|e| e.is_active()).collect();
    if active.is_empty() {
        return NOTHINGNESS_EXPERIENCE.to_string();
    }

    let names = active
        .iter()
        .map(|e| format!("\"{}\"", e.short_name()))
        .collect::<Vec<_>>()
        .join(", ");
    let inactive = elements.len() - active.len();

    format!(
        "Experiencing {names}. This experience is highly specific because it is \
         differentiated from {inactive} other potential states."
    )
}

/// The five insulated processes, in display order.
pub fn default_processes() -> Vec<Unit> {
    vec![
        Unit::process(
            "retina",
            "Retina",
            "Transduces light into neural signals; feeds the complex but is not part of it.",
        ),
        Unit::process(
            "afferent-pathway",
            "Afferent Pathway",
            "Carries sensory signals from the retina towards the cortex.",
        ),
        Unit::process(
            "motor-pathway",
            "Motor Pathway",
            "Carries motor commands out of the cortex once the experience has formed.",
        ),
        Unit::process(
            "subcortical-loop",
            "Subcortical Loop",
            "Basal ganglia loop that gates actions without contributing to experience.",
        ),
        Unit::process(
            "cerebellum",
            "Cerebellum",
            "Always-on background process with massive neuron count but no integration.",
        )
        .always_on(),
    ]
}

/// The main complex with its fixed repertoire of five elements.
pub fn default_complex() -> Complex {
    let elements = vec![
        Unit::element("blue", "Blue Neurons", "Respond to blue light."),
        Unit::element("red", "Red Neurons", "Respond to red light."),
        Unit::element("shape", "Shape Neurons", "Respond to contours and forms."),
        Unit::element("sound", "Sound Neurons", "Respond to auditory input."),
        Unit::element("thought", "Thought Neurons", "Carry abstract, non-sensory content."),
    ];
    Complex {
        display_name: "Main Complex".to_string(),
        description: "Cortical elements whose joint state specifies a single experience."
            .to_string(),
        is_active: false,
        elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repertoire(n: usize) -> Vec<Unit> {
        (0..n)
            .map(|i| Unit::element(format!("e{i}"), format!("E{i} Neurons"), ""))
            .collect()
    }

    #[test]
    fn test_integration_score_small_complex_is_zero() {
        assert_eq!(integration_score(&[]), 0.0);
        assert_eq!(integration_score(&repertoire(1)), 0.0);
    }

    #[test]
    fn test_integration_score_equals_count() {
        assert_eq!(integration_score(&repertoire(2)), 2.0);
        assert_eq!(integration_score(&repertoire(5)), 5.0);
        assert_eq!(integration_score(&repertoire(12)), 12.0);
        assert_eq!(default_complex().integration_score(), 5.0);
    }

    #[test]
    fn test_integration_score_large_repertoire_stays_finite() {
        for n in [1_023, 1_024, 5_000] {
            let score = integration_score(&repertoire(n));
            assert!(score.is_finite(), "score({n}) = {score}");
            assert_eq!(score, n as f64);
        }
    }

    #[test]
    fn test_nothingness_independent_of_size() {
        for n in [0, 1, 5, 9] {
            assert_eq!(experience_description(&repertoire(n)), NOTHINGNESS_EXPERIENCE);
        }
    }

    #[test]
    fn test_blue_only_experience() {
        let mut complex = default_complex();
        assert!(complex.activate_element("blue"));

        let text = complex.experience_description();
        assert!(text.contains("\"Blue\""), "{text}");
        assert!(!text.contains("Neurons"), "{text}");
        assert!(text.contains("4 other potential states"), "{text}");
    }

    #[test]
    fn test_experience_follows_sequence_order() {
        let mut complex = default_complex();
        complex.activate_element("sound");
        complex.activate_element("blue");

        let text = complex.experience_description();
        assert!(text.starts_with("Experiencing \"Blue\", \"Sound\"."), "{text}");
        assert!(text.contains("3 other potential states"), "{text}");
    }

    #[test]
    fn test_short_name_without_suffix() {
        let unit = Unit::element("x", "Plain", "");
        assert_eq!(unit.short_name(), "Plain");
    }

    #[test]
    fn test_missing_element_is_noop() {
        let mut complex = default_complex();
        assert!(!complex.activate_element("green"));
        assert!(!complex.is_active());
        assert!(complex.elements().iter().all(|e| !e.is_active()));
    }

    #[test]
    fn test_complex_activity_tracks_elements() {
        let mut complex = default_complex();
        complex.activate_element("red");
        assert!(complex.is_active());
        complex.restore_defaults();
        assert!(!complex.is_active());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let elements = vec![Unit::element("a", "A", ""), Unit::element("a", "B", "")];
        assert_eq!(
            Complex::new("c", "", elements).unwrap_err(),
            PhiError::DuplicateId("a".to_string())
        );
    }

    #[test]
    fn test_cerebellum_defaults_active() {
        let processes = default_processes();
        for p in &processes {
            assert_eq!(p.is_active(), p.id() == "cerebellum", "{}", p.id());
            assert_eq!(p.role(), Role::Process);
        }
    }
}
