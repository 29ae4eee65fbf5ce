use crate::config::OutputFormat;
use phi_core::{RunPhase, SimulationState, Unit};

pub fn render(state: &SimulationState, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(state).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
        }
        OutputFormat::Text => render_text(state),
    }
}

fn phase_label(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Idle => "IDLE",
        RunPhase::Running => "RUNNING",
        RunPhase::Completed => "COMPLETED",
    }
}

fn on_off(unit: &Unit) -> &'static str {
    if unit.is_active() {
        "ON"
    } else {
        "off"
    }
}

fn render_text(state: &SimulationState) -> String {
    let mut out = format!(
        "#{} {} +{}ms | integration score {:.2}\n",
        state.revision,
        phase_label(state.phase),
        state.elapsed_ms,
        state.integration_score
    );

    for process in &state.processes {
        out.push_str(&format!(
            "  {:<18} {}\n",
            process.display_name(),
            on_off(process)
        ));
    }

    let elements = state
        .complex
        .elements()
        .iter()
        .map(|e| {
            if e.is_active() {
                format!("[{}]", e.short_name())
            } else {
                e.short_name().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let complex_state = if state.complex.is_active() { "ON" } else { "off" };
    out.push_str(&format!(
        "  {:<18} {} {}\n",
        state.complex.display_name(),
        complex_state,
        elements
    ));
    out.push_str(&format!("  experience: {}", state.resulting_experience));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use phi_core::{ManualClock, SimulationConfig, SimulationController};

    fn ignited() -> SimulationState {
        let mut sim = SimulationController::new(ManualClock::new(), SimulationConfig::default())
            .unwrap();
        sim.start();
        sim.advance_by(1_500);
        sim.snapshot()
    }

    #[test]
    fn test_text_marks_active_elements() {
        let text = render(&ignited(), OutputFormat::Text);
        assert!(text.contains("RUNNING +1500ms"), "{text}");
        assert!(text.contains("[Blue] Red Shape Sound Thought"), "{text}");
        assert!(text.contains("integration score 5.00"), "{text}");
    }

    #[test]
    fn test_json_is_single_line() {
        let line = render(&ignited(), OutputFormat::Json);
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["phase"], "running");
    }
}
