//! Typewriter renderer.
//!
//! Owns the story transcript. System, error and player messages are appended
//! fully rendered; narration is revealed one character per scheduled step.
//! A single task slot guarantees that at most one message animates at a time:
//! starting a new animation finalizes the previous one first.

use std::ops::Range;
use std::time::Duration;

use crate::markup::format_text;
use crate::message::Message;
use crate::pacing::{DelayPolicy, NaturalPacing, DEFAULT_BASE_SPEED};
use crate::scheduler::{Scheduler, TimerId, TimerQueue};
use crate::segment::paragraph_ranges;

/// Pause before the first character of a new paragraph.
pub const DEFAULT_PARAGRAPH_PAUSE: Duration = Duration::from_millis(200);

/// Stable identity of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

/// Handle to an animated message, accepted by [`Typewriter::skip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(MessageId);

impl AnimationHandle {
    pub fn message_id(&self) -> MessageId {
        self.0
    }
}

/// Reveal speed for one animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationOptions {
    pub base_speed: Duration,
    pub paragraph_pause: Duration,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            base_speed: DEFAULT_BASE_SPEED,
            paragraph_pause: DEFAULT_PARAGRAPH_PAUSE,
        }
    }
}

/// What changed in the transcript, for front ends to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// A new entry took its slot at the end of the transcript.
    Appended { id: MessageId },
    /// Bytes `range` of the entry's raw text became visible.
    Revealed { id: MessageId, range: Range<usize> },
    /// The entry shows its full text.
    Completed { id: MessageId },
    /// All entries were removed (a new session began).
    Cleared,
}

/// One message in the transcript and how much of it is visible.
#[derive(Debug, Clone)]
pub struct Entry {
    id: MessageId,
    message: Message,
    revealed: usize,
    complete: bool,
}

impl Entry {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The raw text revealed so far.
    pub fn visible_text(&self) -> &str {
        &self.message.raw_text[..self.revealed]
    }

    /// Safe markup for what is currently visible.
    pub fn markup(&self) -> String {
        format_text(self.visible_text())
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Append-only, chronologically ordered list of entries.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&Entry> {
        self.index_of(id).map(|i| &self.entries[i])
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Entry> {
        self.index_of(id).map(move |i| &mut self.entries[i])
    }

    // Ids only ever grow, so entries stay sorted by id.
    fn index_of(&self, id: MessageId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |e| e.id).ok()
    }
}

/// The in-flight reveal.
#[derive(Debug)]
struct AnimationTask {
    handle: AnimationHandle,
    paragraphs: Vec<Range<usize>>,
    paragraph: usize,
    offset: usize,
    options: AnimationOptions,
    timer: Option<TimerId>,
}

/// Transcript renderer with a single animation slot.
pub struct Typewriter<S: Scheduler = TimerQueue> {
    transcript: Transcript,
    scheduler: S,
    pacing: Box<dyn DelayPolicy + Send>,
    defaults: AnimationOptions,
    active: Option<AnimationTask>,
    next_id: u64,
    events: Vec<RenderEvent>,
}

impl Typewriter<TimerQueue> {
    pub fn new() -> Self {
        Self::with_scheduler(TimerQueue::new())
    }
}

impl Default for Typewriter<TimerQueue> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> Typewriter<S> {
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            transcript: Transcript::default(),
            scheduler,
            pacing: Box::new(NaturalPacing::new()),
            defaults: AnimationOptions::default(),
            active: None,
            next_id: 0,
            events: Vec::new(),
        }
    }

    /// Replace the per-character delay policy.
    pub fn with_pacing(mut self, pacing: impl DelayPolicy + Send + 'static) -> Self {
        self.pacing = Box::new(pacing);
        self
    }

    /// Options used by [`Typewriter::append`].
    pub fn with_default_options(mut self, options: AnimationOptions) -> Self {
        self.defaults = options;
        self
    }

    pub fn default_options(&self) -> AnimationOptions {
        self.defaults
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Append a message, animating it only if its kind calls for that.
    pub fn append(&mut self, message: Message) -> MessageId {
        if message.kind.is_animated() {
            let options = self.defaults;
            self.append_animated(message, options).message_id()
        } else {
            self.append_instant(message)
        }
    }

    /// Append a fully rendered message. Never touches animation state.
    pub fn append_instant(&mut self, message: Message) -> MessageId {
        let revealed = message.raw_text.len();
        self.push_entry(message, revealed, true)
    }

    /// Append a message and start revealing it.
    ///
    /// Any animation already running is finalized first, so its `Completed`
    /// event precedes everything produced by the new one.
    pub fn append_animated(&mut self, message: Message, options: AnimationOptions) -> AnimationHandle {
        self.skip_active();

        let empty = message.raw_text.is_empty();
        let paragraphs = paragraph_ranges(&message.raw_text);
        let id = self.push_entry(message, 0, empty);
        let handle = AnimationHandle(id);
        if empty {
            return handle;
        }

        let timer = self.scheduler.schedule(Duration::ZERO);
        self.active = Some(AnimationTask {
            handle,
            paragraphs,
            paragraph: 0,
            offset: 0,
            options,
            timer: Some(timer),
        });
        handle
    }

    /// Finish the given animation immediately.
    ///
    /// Returns `false` (and does nothing) if the handle is not the active
    /// animation, which covers already completed or skipped ones.
    pub fn skip(&mut self, handle: AnimationHandle) -> bool {
        match &self.active {
            Some(task) if task.handle == handle => {}
            _ => return false,
        }
        let Some(mut task) = self.active.take() else {
            return false;
        };

        if let Some(timer) = task.timer.take() {
            self.scheduler.cancel(timer);
        }

        let id = handle.message_id();
        if let Some(entry) = self.transcript.get_mut(id) {
            let start = entry.revealed;
            let end = entry.message.raw_text.len();
            entry.revealed = end;
            entry.complete = true;
            if start < end {
                self.events.push(RenderEvent::Revealed { id, range: start..end });
            }
            self.events.push(RenderEvent::Completed { id });
        }
        tracing::debug!(?id, "animation skipped");
        true
    }

    /// Finish whatever is animating. No-op when nothing is.
    pub fn skip_active(&mut self) -> bool {
        match self.active.as_ref().map(|task| task.handle) {
            Some(handle) => self.skip(handle),
            None => false,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_handle(&self) -> Option<AnimationHandle> {
        self.active.as_ref().map(|task| task.handle)
    }

    /// Move the clock forward, running every step that comes due in order.
    pub fn advance(&mut self, elapsed: Duration) {
        let deadline = self.scheduler.now() + elapsed;
        while let Some(timer) = self.scheduler.pop_due(deadline) {
            self.fire(timer);
        }
    }

    /// How long until the next reveal step, if one is pending.
    pub fn time_until_next_step(&self) -> Option<Duration> {
        self.scheduler
            .next_due()
            .map(|due| due.saturating_sub(self.scheduler.now()))
    }

    /// Run one reveal step for `timer`. Timers that do not belong to the
    /// active task are ignored.
    pub fn fire(&mut self, timer: TimerId) {
        let Some(task) = self.active.as_mut() else {
            return;
        };
        if task.timer != Some(timer) {
            return;
        }
        task.timer = None;

        let id = task.handle.message_id();
        let Some(entry) = self.transcript.get_mut(id) else {
            tracing::debug!(?id, "animation target is gone, cancelling");
            self.active = None;
            return;
        };

        let Some(ch) = entry.message.raw_text[task.offset..].chars().next() else {
            entry.complete = true;
            self.events.push(RenderEvent::Completed { id });
            self.active = None;
            return;
        };

        let start = task.offset;
        task.offset += ch.len_utf8();
        entry.revealed = task.offset;
        self.events.push(RenderEvent::Revealed {
            id,
            range: start..task.offset,
        });

        if task.offset >= entry.message.raw_text.len() {
            entry.complete = true;
            self.events.push(RenderEvent::Completed { id });
            self.active = None;
            return;
        }

        let paragraph_end = task
            .paragraphs
            .get(task.paragraph)
            .map_or(usize::MAX, |range| range.end);
        let delay = if task.offset >= paragraph_end {
            task.paragraph += 1;
            task.options.paragraph_pause
        } else {
            self.pacing.delay(ch, task.options.base_speed)
        };
        task.timer = Some(self.scheduler.schedule(delay));
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop every entry, for a fresh session. A running animation is left to
    /// notice its entry is gone and cancel itself on its next step.
    pub fn clear(&mut self) {
        self.transcript.entries.clear();
        self.events.push(RenderEvent::Cleared);
    }

    fn push_entry(&mut self, message: Message, revealed: usize, complete: bool) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.transcript.entries.push(Entry {
            id,
            message,
            revealed,
            complete,
        });
        self.events.push(RenderEvent::Appended { id });
        if complete {
            self.events.push(RenderEvent::Completed { id });
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::FixedPacing;

    const STORY: &str = "The **gate** creaks open. Cold air spills out of the crypt, carrying \
        the smell of old stone and older secrets! You hear <footsteps> somewhere below.\n\n\
        - a torch\n- a rope\nWhat now?";

    fn typewriter() -> Typewriter {
        Typewriter::new().with_pacing(FixedPacing)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_instant_append_is_complete() {
        let mut tw = typewriter();
        let id = tw.append_instant(Message::system("Saved & done <ok>"));
        let entry = tw.transcript().get(id).unwrap();
        assert!(entry.is_complete());
        assert_eq!(entry.markup(), format_text("Saved & done <ok>"));
        assert!(!tw.is_animating());
        assert_eq!(
            tw.drain_events(),
            vec![RenderEvent::Appended { id }, RenderEvent::Completed { id }]
        );
    }

    #[test]
    fn test_skip_matches_instant_render() {
        let mut animated = typewriter();
        let handle = animated.append_animated(Message::narration(STORY), AnimationOptions::default());
        animated.advance(ms(300));
        assert!(animated.skip(handle));

        let mut instant = typewriter();
        let id = instant.append_instant(Message::narration(STORY));

        let a = animated.transcript().get(handle.message_id()).unwrap();
        let b = instant.transcript().get(id).unwrap();
        assert!(a.is_complete());
        assert_eq!(a.markup(), b.markup());
        assert_eq!(a.visible_text(), STORY);
    }

    #[test]
    fn test_revealed_ranges_reconstruct_text() {
        let mut tw = typewriter();
        let handle = tw.append_animated(Message::narration(STORY), AnimationOptions::default());
        let id = handle.message_id();

        let mut rebuilt = String::new();
        let mut steps = 0;
        for _ in 0..10_000 {
            tw.advance(ms(7));
            for event in tw.drain_events() {
                if let RenderEvent::Revealed { id: event_id, range } = event {
                    assert_eq!(event_id, id);
                    assert_eq!(range.start, rebuilt.len(), "no gaps or overlaps");
                    rebuilt.push_str(&STORY[range]);
                    steps += 1;
                }
            }
            if !tw.is_animating() {
                break;
            }
        }

        assert_eq!(rebuilt, STORY);
        assert_eq!(steps, STORY.chars().count(), "one character per step");
        assert!(tw.transcript().get(id).unwrap().is_complete());
    }

    #[test]
    fn test_reconstruction_survives_mid_reveal_skip() {
        let mut tw = typewriter();
        let handle = tw.append_animated(Message::narration(STORY), AnimationOptions::default());
        tw.advance(ms(120));
        tw.skip(handle);

        let rebuilt: String = tw
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                RenderEvent::Revealed { range, .. } => Some(STORY[range].to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(rebuilt, STORY);
    }

    #[test]
    fn test_second_animation_finalizes_first() {
        let mut tw = typewriter();
        let first = tw.append_animated(Message::narration("First story text."), AnimationOptions::default());
        tw.advance(ms(40));
        assert!(!tw.transcript().get(first.message_id()).unwrap().is_complete());
        tw.drain_events();

        let second = tw.append_animated(Message::narration("Second."), AnimationOptions::default());
        let entry = tw.transcript().get(first.message_id()).unwrap();
        assert!(entry.is_complete());
        assert_eq!(entry.visible_text(), "First story text.");
        assert_eq!(tw.active_handle(), Some(second));

        tw.advance(ms(1));
        let events = tw.drain_events();
        let completed_first = events
            .iter()
            .position(|e| *e == RenderEvent::Completed { id: first.message_id() })
            .unwrap();
        let first_step_of_second = events
            .iter()
            .position(|e| matches!(e, RenderEvent::Revealed { id, .. } if *id == second.message_id()))
            .unwrap();
        assert!(completed_first < first_step_of_second);
    }

    #[test]
    fn test_skip_without_animation_is_noop() {
        let mut tw = typewriter();
        tw.append_instant(Message::system("Welcome."));
        tw.drain_events();

        assert!(!tw.skip_active());
        assert!(tw.drain_events().is_empty());
        assert_eq!(tw.transcript().len(), 1);
    }

    #[test]
    fn test_skip_is_idempotent() {
        let mut tw = typewriter();
        let handle = tw.append_animated(Message::narration("Once."), AnimationOptions::default());
        assert!(tw.skip(handle));
        assert!(!tw.skip(handle));
        tw.advance(ms(1_000));
        assert_eq!(tw.transcript().get(handle.message_id()).unwrap().visible_text(), "Once.");
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut tw = typewriter();
        let handle = tw.append_animated(Message::narration("Slow reveal."), AnimationOptions::default());
        let stale = tw.active.as_ref().and_then(|task| task.timer).unwrap();
        tw.skip(handle);
        tw.drain_events();
        assert!(tw.time_until_next_step().is_none());

        tw.fire(stale);
        assert!(tw.drain_events().is_empty());
        assert!(!tw.is_animating());
    }

    #[test]
    fn test_later_instant_message_keeps_order() {
        let mut tw = typewriter();
        let story = tw.append_animated(Message::narration("A long tale begins."), AnimationOptions::default());
        tw.advance(ms(30));
        let notice = tw.append_instant(Message::system("Connection restored."));

        let ids: Vec<MessageId> = tw.transcript().entries().iter().map(Entry::id).collect();
        assert_eq!(ids, vec![story.message_id(), notice]);
        assert!(tw.is_animating(), "instant messages do not interrupt narration");
    }

    #[test]
    fn test_paragraph_pause() {
        let text = "a".repeat(130) + ". Second sentence. Next paragraph.";
        let mut tw = Typewriter::new().with_pacing(|_: char, _: Duration| Duration::ZERO);
        let options = AnimationOptions {
            base_speed: ms(10),
            paragraph_pause: ms(200),
        };
        let handle = tw.append_animated(Message::narration(text.clone()), options);

        tw.advance(ms(1));
        let first_paragraph = text.len() - "Next paragraph.".len();
        let entry = tw.transcript().get(handle.message_id()).unwrap();
        assert_eq!(entry.visible_text().len(), first_paragraph);
        assert_eq!(tw.time_until_next_step(), Some(ms(199)));

        tw.advance(ms(199));
        assert!(tw.transcript().get(handle.message_id()).unwrap().is_complete());
        assert!(!tw.is_animating());
    }

    #[test]
    fn test_cleared_target_cancels_silently() {
        let mut tw = typewriter();
        tw.append_animated(Message::narration("Vanishing words."), AnimationOptions::default());
        tw.clear();
        tw.advance(ms(100));
        assert!(!tw.is_animating());
        assert!(tw.transcript().is_empty());
    }

    #[test]
    fn test_empty_narration_completes_at_once() {
        let mut tw = typewriter();
        let handle = tw.append_animated(Message::narration(""), AnimationOptions::default());
        assert!(!tw.is_animating());
        assert!(tw.transcript().get(handle.message_id()).unwrap().is_complete());
    }

    #[test]
    fn test_append_routes_by_kind() {
        let mut tw = typewriter();
        tw.append(Message::player("look around"));
        assert!(!tw.is_animating());
        tw.append(Message::narration("Dust everywhere."));
        assert!(tw.is_animating());
    }
}
