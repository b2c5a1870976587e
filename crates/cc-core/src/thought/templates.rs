//! System 1: finite, predictable-cost template matching against stimulus
//! type and `raw_data` (§4.3). Never fails; zero matches is a valid result.

use crate::domain::{MotivationBreakdown, Stimulus, StimulusType};

pub struct TemplateMatch {
    pub content: String,
    pub breakdown: MotivationBreakdown,
}

type TemplateFn = fn(&Stimulus) -> Option<TemplateMatch>;

pub struct TemplateRegistry {
    templates: Vec<TemplateFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self { templates: Vec::new() }
    }

    pub fn register(&mut self, template: TemplateFn) {
        self.templates.push(template);
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(temporal_check_in);
        registry.register(goal_nudge);
        registry.register(social_reach_out);
        registry.register(anniversary_greeting);
        registry
    }

    pub fn match_all(&self, stimulus: &Stimulus) -> Vec<TemplateMatch> {
        self.templates.iter().filter_map(|t| t(stimulus)).collect()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn temporal_check_in(stimulus: &Stimulus) -> Option<TemplateMatch> {
    if stimulus.stimulus_type != StimulusType::Temporal {
        return None;
    }
    Some(TemplateMatch {
        content: format!("checking in: {}", stimulus.content),
        breakdown: MotivationBreakdown { relevance: 0.5, urgency: 0.3, impact: 0.4, coherence: 0.8, originality: 0.2 },
    })
}

fn goal_nudge(stimulus: &Stimulus) -> Option<TemplateMatch> {
    if stimulus.stimulus_type != StimulusType::Goal {
        return None;
    }
    Some(TemplateMatch {
        content: format!("nudge about: {}", stimulus.content),
        breakdown: MotivationBreakdown { relevance: 0.8, urgency: 0.5, impact: 0.7, coherence: 0.7, originality: 0.3 },
    })
}

fn social_reach_out(stimulus: &Stimulus) -> Option<TemplateMatch> {
    if stimulus.stimulus_type != StimulusType::Social {
        return None;
    }
    Some(TemplateMatch {
        content: "reaching out after a while".to_string(),
        breakdown: MotivationBreakdown { relevance: 0.6, urgency: 0.4, impact: 0.5, coherence: 0.7, originality: 0.4 },
    })
}

fn anniversary_greeting(stimulus: &Stimulus) -> Option<TemplateMatch> {
    if stimulus.stimulus_type != StimulusType::Anniversary {
        return None;
    }
    Some(TemplateMatch {
        content: format!("marking the occasion: {}", stimulus.content),
        breakdown: MotivationBreakdown { relevance: 0.7, urgency: 0.6, impact: 0.6, coherence: 0.9, originality: 0.5 },
    })
}
