//! Demo Script
//!
//! Without a voice pipeline attached, the face is driven by a looping
//! script that walks through the emotions and fakes listening and speaking
//! turns. Gesture effects are "played" by waiting out their estimated
//! duration before releasing the petting lock.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::runtime::Handle;
use tokio::sync::watch;

use expression_core::effects::estimated_speech_duration;
use expression_core::{CommandSender, Effect};

/// Emotions the demo cycles through
pub const DEMO_EMOTIONS: &[&str] = &[
    "happy", "curious", "excited", "playful", "surprised", "loving", "sleepy", "bored", "sad",
    "lonely", "scared", "angry",
];

/// How long a non-speaking effect holds the petting lock
const EFFECT_PLAYBACK: Duration = Duration::from_millis(800);

/// Interval between fake speaking level updates
const BABBLE_STEP: Duration = Duration::from_millis(90);

/// One scripted action
#[derive(Clone, Debug, PartialEq)]
pub enum DemoStep {
    /// Transition to a random emotion
    RandomEmotion {
        /// Transition length
        transition: Duration,
    },
    /// Transition to a named emotion
    Emotion {
        /// Emotion name
        name: &'static str,
        /// Transition length
        transition: Duration,
    },
    /// Listening indicator on/off
    Listening(bool),
    /// Speak with jittering levels for a while
    Babble(Duration),
    /// Do nothing
    Pause(Duration),
}

/// One pass of the demo loop
pub fn demo_script() -> Vec<DemoStep> {
    vec![
        DemoStep::Emotion {
            name: "happy",
            transition: Duration::from_millis(500),
        },
        DemoStep::Pause(Duration::from_secs(2)),
        DemoStep::Listening(true),
        DemoStep::Pause(Duration::from_millis(2500)),
        DemoStep::Listening(false),
        DemoStep::Emotion {
            name: "curious",
            transition: Duration::from_millis(400),
        },
        DemoStep::Babble(Duration::from_secs(3)),
        DemoStep::Pause(Duration::from_secs(1)),
        DemoStep::RandomEmotion {
            transition: Duration::from_millis(700),
        },
        DemoStep::Pause(Duration::from_secs(3)),
        DemoStep::RandomEmotion {
            transition: Duration::from_millis(300),
        },
        DemoStep::Babble(Duration::from_secs(2)),
        DemoStep::Pause(Duration::from_secs(2)),
    ]
}

/// Sleep unless shutdown is signalled first; returns false on shutdown
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        _ = shutdown.changed() => false,
    }
}

fn random_emotion() -> &'static str {
    DEMO_EMOTIONS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("happy")
}

fn random_level() -> f32 {
    rand::thread_rng().gen_range(0.2..1.0)
}

async fn run_step(
    step: &DemoStep,
    controller: &CommandSender,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    match step {
        DemoStep::RandomEmotion { transition } => {
            let name = random_emotion();
            tracing::debug!(emotion = name, "Demo emotion");
            controller.set_emotion(name, *transition);
            true
        }
        DemoStep::Emotion { name, transition } => {
            controller.set_emotion(*name, *transition);
            true
        }
        DemoStep::Listening(active) => {
            controller.set_listening(*active);
            true
        }
        DemoStep::Babble(duration) => {
            let steps = (duration.as_millis() / BABBLE_STEP.as_millis()).max(1);
            for _ in 0..steps {
                controller.set_speaking(true, Some(random_level()));
                if !pause(BABBLE_STEP, shutdown).await {
                    controller.set_speaking(false, None);
                    return false;
                }
            }
            controller.set_speaking(false, None);
            true
        }
        DemoStep::Pause(duration) => pause(*duration, shutdown).await,
    }
}

/// Loop the demo script until `shutdown` turns true
pub async fn run_demo(controller: CommandSender, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("Demo script started");
    let script = demo_script();
    'outer: loop {
        for step in &script {
            if !run_step(step, &controller, &mut shutdown).await {
                break 'outer;
            }
        }
    }
    tracing::info!("Demo script stopped");
}

/// How long an effect is pretended to play
pub fn playback_time(effect: &Effect) -> Duration {
    effect
        .speak()
        .map_or(EFFECT_PLAYBACK, estimated_speech_duration)
}

/// Effect callback that logs the effect and releases the petting lock
/// once its playback time has passed
pub fn effect_player(
    controller: CommandSender,
    runtime: Handle,
) -> impl Fn(&Effect) -> anyhow::Result<()> + Send + Sync + 'static {
    move |effect: &Effect| {
        if let Some(text) = effect.speak() {
            tracing::info!(text, "Would speak");
        }
        if let Some(sound) = effect.sound() {
            tracing::info!(sound, "Would play sound");
        }
        if let Some(action) = effect.hardware() {
            tracing::info!(action, "Would trigger hardware");
        }
        let wait = playback_time(effect);
        let controller = controller.clone();
        runtime.spawn(async move {
            tokio::time::sleep(wait).await;
            controller.set_petting(false);
        });
        Ok(())
    }
}
