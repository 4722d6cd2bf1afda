//! Interactive play loop.
//!
//! Reads one line at a time, advances the open game's timers by the wall
//! clock time since the previous line, feeds the line to the game and
//! prints the screen again. Lines starting with `:` are commands.

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::trace::{format_traces, TraceOptions, TraceOutput};
use crate::config::Config;
use crate::content::ContentPack;
use crate::core::{RoundResult, Step, ToastKind};
use crate::error::Result;
use crate::games::{
    AlphabetGame, AnswerOutcome, Controller, Key, ListeningGame, MatchOutcome, MatchingGame,
    ReadingGame, RecordingOutcome, SpeakingGame, SubmitOutcome, WritingGame,
};
use crate::hub::{Hub, Route};
use crate::speech::{
    CaptureMode, CommandSynthesizer, MutedSynthesizer, PlaybackOutcome, SpeechSynthesizer,
    TypedDictation,
};

type Voice = Box<dyn SpeechSynthesizer>;

const HELP: &str = "\
Commands:
  :next   next word, sentence, level, page or letter
  :prev   go back one
  :hear   play the sound again
  :rec    start or stop recording (Voice Launch)
  :hub    back to Mission Control
  :quit   leave
Anything else is your answer.";

/// Options for an interactive session.
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Never play sound.
    pub mute: bool,
    /// Print the session trace as JSON when the session ends.
    pub trace: bool,
    /// Seed for word draws and picture shuffles.
    pub seed: Option<u64>,
}

/// Whether the loop keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Screen {
    Listening(ListeningGame<Voice>),
    Writing(WritingGame),
    Matching(MatchingGame),
    Speaking(SpeakingGame<Voice, TypedDictation>),
    Reading(ReadingGame),
    Alphabet(AlphabetGame<Voice>),
}

/// A terminal session: the hub plus at most one open game.
pub struct PlaySession {
    config: Config,
    content: ContentPack,
    options: PlayOptions,
    hub: Hub,
    screen: Option<Screen>,
    traces: Vec<TraceOutput>,
}

impl PlaySession {
    /// Create a session on the hub screen.
    pub fn new(config: Config, content: ContentPack, options: PlayOptions) -> Self {
        Self {
            config,
            content,
            options,
            hub: Hub::new(),
            screen: None,
            traces: Vec::new(),
        }
    }

    /// The screen being shown.
    pub fn route(&self) -> Route {
        self.hub.current()
    }

    /// Visits so far.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Open a game with fresh state, or go back to the hub.
    pub fn open(&mut self, route: Route) -> Result<()> {
        self.close_screen();
        let screen = match route {
            Route::Hub => {
                self.hub.return_to_hub();
                return Ok(());
            }
            Route::Listening => Screen::Listening(ListeningGame::with_rng(
                self.content.words.clone(),
                &self.config,
                self.voice(),
                self.rng(),
            )?),
            Route::Writing => Screen::Writing(WritingGame::new(self.content.typing.clone())?),
            Route::Matching => Screen::Matching(MatchingGame::with_rng(
                self.content.matching.clone(),
                &self.config.matching,
                self.rng(),
            )?),
            Route::Speaking => Screen::Speaking(SpeakingGame::new(
                self.content.speaking.clone(),
                &self.config,
                self.voice(),
                TypedDictation::new(),
            )?),
            Route::Reading => Screen::Reading(ReadingGame::new(
                self.content.stories.clone(),
                &self.config.reading,
            )?),
            Route::Alphabet => Screen::Alphabet(AlphabetGame::new(
                self.content.alphabet.clone(),
                &self.config,
                self.voice(),
            )?),
        };
        self.hub.open(route);
        self.screen = Some(screen);
        Ok(())
    }

    /// Run until `:quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, start: Route, input: R, out: &mut W) -> Result<()> {
        self.open(start)?;
        self.render(out)?;

        let mut last = Instant::now();
        for line in input.lines() {
            let line = line?;
            let now = Instant::now();
            let flow = self.handle_line(&line, now.duration_since(last), out)?;
            last = now;
            if flow == Flow::Quit {
                break;
            }
        }
        self.finish(out)
    }

    /// Handle one line of input after `elapsed` time has passed.
    pub fn handle_line<W: Write>(
        &mut self,
        line: &str,
        elapsed: Duration,
        out: &mut W,
    ) -> Result<Flow> {
        self.tick(elapsed);

        let trimmed = line.trim();
        let note = if let Some(command) = trimmed.strip_prefix(':') {
            match command.trim().to_ascii_lowercase().as_str() {
                "quit" | "q" => {
                    writeln!(out, "Bye, space explorer!")?;
                    return Ok(Flow::Quit);
                }
                "help" | "?" => HELP.to_string(),
                "hub" => {
                    self.open(Route::Hub)?;
                    String::new()
                }
                other => match self.screen.as_mut() {
                    Some(screen) => screen.command(other),
                    None => "Pick a mission first.".to_string(),
                },
            }
        } else if trimmed.is_empty() && !self.screen.as_ref().is_some_and(Screen::keeps_spaces) {
            String::new()
        } else if self.screen.is_none() {
            self.pick_game(trimmed)?
        } else {
            match self.screen.as_mut().map(|s| s.input(line)) {
                Some(Ok(note)) => note,
                Some(Err(e)) if e.is_recoverable() => e.to_string(),
                Some(Err(e)) => return Err(e),
                None => String::new(),
            }
        };

        if !note.is_empty() {
            writeln!(out, "{}", note)?;
        }
        self.render(out)?;
        Ok(Flow::Continue)
    }

    /// Close the open game and print the trace if asked for.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.close_screen();
        if self.options.trace {
            let options = TraceOptions {
                json: true,
                ..Default::default()
            };
            writeln!(out, "{}", format_traces(&self.traces, &options))?;
        }
        Ok(())
    }

    fn tick(&mut self, elapsed: Duration) {
        if let Some(screen) = self.screen.as_mut() {
            screen.poll_playback();
            screen.controller_mut().advance(elapsed);
        }
    }

    fn pick_game(&mut self, line: &str) -> Result<String> {
        let games = Route::games();
        let route = match line.parse::<usize>() {
            Ok(n) if (1..=games.len()).contains(&n) => games[n - 1],
            Ok(n) => return Ok(format!("There is no mission {}.", n)),
            Err(_) => match line.parse::<Route>() {
                Ok(route) => route,
                Err(e) => return Ok(e.to_string()),
            },
        };
        self.open(route)?;
        Ok(String::new())
    }

    fn close_screen(&mut self) {
        if let Some(screen) = self.screen.take() {
            let trace = TraceOutput::from_log(
                screen.route().name(),
                screen.controller().log(),
                &TraceOptions::default(),
            );
            self.traces.push(trace);
        }
    }

    fn voice(&self) -> Voice {
        if self.options.mute {
            Box::new(MutedSynthesizer)
        } else {
            Box::new(CommandSynthesizer::from_config(&self.config.speech))
        }
    }

    fn rng(&self) -> StdRng {
        match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        let Some(screen) = &self.screen else {
            writeln!(out, "== {} ==", Route::Hub.title())?;
            for (i, route) in Route::games().iter().enumerate() {
                writeln!(out, "  {}. {} - {}", i + 1, route.title(), route.description())?;
            }
            writeln!(out, "Type a mission name or number. :quit to leave.")?;
            return Ok(());
        };

        let controller = screen.controller();
        writeln!(
            out,
            "== {} ==  {}",
            screen.route().title(),
            controller.mood().face()
        )?;
        for line in screen.view() {
            writeln!(out, "{}", line)?;
        }
        if let Some(toast) = controller.toast() {
            let mark = match toast.kind {
                ToastKind::Success => "*",
                ToastKind::Error => "!",
                ToastKind::Info => "-",
            };
            writeln!(out, "{} {}", mark, toast.message)?;
        }
        Ok(())
    }
}

impl Screen {
    fn route(&self) -> Route {
        match self {
            Screen::Listening(_) => Route::Listening,
            Screen::Writing(_) => Route::Writing,
            Screen::Matching(_) => Route::Matching,
            Screen::Speaking(_) => Route::Speaking,
            Screen::Reading(_) => Route::Reading,
            Screen::Alphabet(_) => Route::Alphabet,
        }
    }

    fn controller(&self) -> &dyn Controller {
        match self {
            Screen::Listening(g) => g,
            Screen::Writing(g) => g,
            Screen::Matching(g) => g,
            Screen::Speaking(g) => g,
            Screen::Reading(g) => g,
            Screen::Alphabet(g) => g,
        }
    }

    fn controller_mut(&mut self) -> &mut dyn Controller {
        match self {
            Screen::Listening(g) => g,
            Screen::Writing(g) => g,
            Screen::Matching(g) => g,
            Screen::Speaking(g) => g,
            Screen::Reading(g) => g,
            Screen::Alphabet(g) => g,
        }
    }

    fn poll_playback(&mut self) {
        match self {
            Screen::Listening(g) => g.poll_playback(),
            Screen::Speaking(g) => g.poll_playback(),
            Screen::Alphabet(g) => g.poll_playback(),
            Screen::Writing(_) | Screen::Matching(_) | Screen::Reading(_) => {}
        }
    }

    fn command(&mut self, name: &str) -> String {
        match name {
            "next" | "n" => {
                let step = match self {
                    Screen::Listening(g) => {
                        g.next();
                        Step::Moved
                    }
                    Screen::Writing(g) => g.next_exercise(),
                    Screen::Matching(g) => g.next_level(),
                    Screen::Speaking(g) => g.next_exercise(),
                    Screen::Reading(g) => g.next_page(),
                    Screen::Alphabet(g) => g.next(),
                };
                describe_step(step, "That's the last one.")
            }
            "prev" | "p" => {
                let step = match self {
                    Screen::Writing(g) => g.previous_exercise(),
                    Screen::Speaking(g) => g.previous_exercise(),
                    Screen::Reading(g) => g.previous_page(),
                    Screen::Alphabet(g) => g.previous(),
                    Screen::Listening(_) | Screen::Matching(_) => {
                        return "No going back here. Try :next.".to_string()
                    }
                };
                describe_step(step, "That's the first one.")
            }
            "hear" | "h" => {
                let outcome = match self {
                    Screen::Listening(g) => g.play_word(),
                    Screen::Speaking(g) => g.play_reference(),
                    Screen::Alphabet(g) => g.play_letter(),
                    Screen::Writing(_) | Screen::Matching(_) | Screen::Reading(_) => {
                        return "Nothing to hear here.".to_string()
                    }
                };
                match outcome {
                    PlaybackOutcome::Started => "Playing...".to_string(),
                    PlaybackOutcome::Busy => "Still playing, wait for it.".to_string(),
                    PlaybackOutcome::Failed(_) => String::new(),
                }
            }
            "rec" | "r" => match self {
                Screen::Speaking(g) => match g.toggle_recording() {
                    RecordingOutcome::Started(CaptureMode::Transcribing) => {
                        "Recording! Type what you said, then :rec to stop.".to_string()
                    }
                    _ => String::new(),
                },
                _ => format!("Recording only works in {}.", Route::Speaking.title()),
            },
            other => format!("Unknown command :{}. Try :help.", other),
        }
    }

    /// Typing judges every key, spaces included, so its lines stay untrimmed.
    fn keeps_spaces(&self) -> bool {
        matches!(self, Screen::Writing(_))
    }

    fn input(&mut self, raw: &str) -> Result<String> {
        if let Screen::Writing(g) = self {
            if raw.is_empty() {
                return Ok(String::new());
            }
            if g.is_complete() {
                return Ok("Sentence done! Type :next for another.".to_string());
            }
            g.press_str(raw);
            return Ok(String::new());
        }

        let line = raw.trim();
        match self {
            Screen::Listening(g) => Ok(spell(g, line)),
            Screen::Writing(_) => Ok(String::new()),
            Screen::Matching(g) => pick_pairs(g, line),
            Screen::Speaking(g) => {
                if !g.recognizer().is_active() {
                    Ok("Type :rec to start recording first.".to_string())
                } else if g.on_transcript(line) {
                    Ok(format!("Heard: {}", line))
                } else {
                    Ok("Words can't be checked for this recording.".to_string())
                }
            }
            Screen::Reading(g) => answer(g, line),
            Screen::Alphabet(g) => match line.chars().next() {
                Some(letter) => g.select(letter).map(|_| String::new()),
                None => Ok(String::new()),
            },
        }
    }

    fn view(&self) -> Vec<String> {
        match self {
            Screen::Listening(g) => listening_view(g),
            Screen::Writing(g) => writing_view(g),
            Screen::Matching(g) => matching_view(g),
            Screen::Speaking(g) => speaking_view(g),
            Screen::Reading(g) => reading_view(g),
            Screen::Alphabet(g) => {
                let card = g.current();
                vec![
                    format!("    {}", card.letter),
                    format!("{} is for {} {}", card.letter, card.word, card.image),
                    "Type a letter to jump, :next, :prev, :hear".to_string(),
                ]
            }
        }
    }
}

fn describe_step(step: Step, stayed: &str) -> String {
    match step {
        Step::Stayed => stayed.to_string(),
        Step::Moved | Step::Wrapped => String::new(),
    }
}

fn spell(game: &mut ListeningGame<Voice>, line: &str) -> String {
    if game.is_completed() {
        return "Type :next for a new word.".to_string();
    }
    while game.press(Key::Delete) {}
    for c in line.chars() {
        game.press(Key::Letter(c));
    }
    match game.submit() {
        SubmitOutcome::Ignored => "Type the letters you hear.".to_string(),
        SubmitOutcome::Correct
        | SubmitOutcome::Incorrect { .. }
        | SubmitOutcome::Revealed { .. } => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pick {
    Word(usize),
    Picture(usize),
}

/// Numbers pick word rows, letters pick picture rows: `2b`, `2 b`, `b`.
/// A number too large for `usize` makes the whole line unreadable.
fn parse_picks(line: &str) -> Option<Vec<Pick>> {
    let mut picks = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == ',' {
            continue;
        }
        if let Some(digit) = c.to_digit(10) {
            let mut row = digit as usize;
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                row = row.checked_mul(10)?.checked_add(digit as usize)?;
                chars.next();
            }
            picks.push(Pick::Word(row));
        } else if c.is_ascii_alphabetic() {
            let row = (c.to_ascii_lowercase() as u8 - b'a') as usize + 1;
            picks.push(Pick::Picture(row));
        } else {
            return None;
        }
    }
    Some(picks)
}

fn picture_label(row: usize) -> char {
    char::from(b'a' + (row % 26) as u8)
}

fn pick_pairs(game: &mut MatchingGame, line: &str) -> Result<String> {
    let Some(picks) = parse_picks(line) else {
        return Ok("Pick a word number and a picture letter, like 2b.".to_string());
    };

    let mut note = String::new();
    for pick in picks {
        let outcome = match pick {
            Pick::Word(row) => {
                let id = row
                    .checked_sub(1)
                    .and_then(|i| game.word_order().get(i).copied());
                match id {
                    Some(id) => game.select_word(id)?,
                    None => return Ok(format!("There is no word {}.", row)),
                }
            }
            Pick::Picture(row) => {
                let id = row
                    .checked_sub(1)
                    .and_then(|i| game.image_order().get(i).copied());
                match id {
                    Some(id) => game.select_image(id)?,
                    None => {
                        return Ok(format!("There is no picture {}.", picture_label(row - 1)))
                    }
                }
            }
        };
        note = match outcome {
            MatchOutcome::Ignored => "That one is already matched.".to_string(),
            MatchOutcome::LevelComplete => {
                "All pairs found! Type :next for a new level.".to_string()
            }
            MatchOutcome::Selected
            | MatchOutcome::Deselected
            | MatchOutcome::Matched
            | MatchOutcome::Mismatched => String::new(),
        };
    }
    Ok(note)
}

fn answer(game: &mut ReadingGame, line: &str) -> Result<String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if let [keyword, id] = words.as_slice() {
        if keyword.eq_ignore_ascii_case("story") {
            return match id.parse::<u32>() {
                Ok(id) => game.select_story(id).map(|_| String::new()),
                Err(_) => Ok("Pick a story by number, like: story 2".to_string()),
            };
        }
    }

    let numbers: Vec<u32> = words.iter().filter_map(|w| w.parse().ok()).collect();
    let [question, choice] = numbers.as_slice() else {
        return Ok("Answer with the question and answer numbers, like: 1 2".to_string());
    };
    match game.select_answer(*question, *choice)? {
        AnswerOutcome::AlreadyAnswered => {
            Ok(format!("You already answered question {}.", question))
        }
        AnswerOutcome::Correct | AnswerOutcome::Incorrect => Ok(String::new()),
    }
}

fn spaced(word: &str) -> String {
    word.chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn listening_view(game: &ListeningGame<Voice>) -> Vec<String> {
    let shown = match (game.revealed(), game.last_result()) {
        (Some(word), _) => spaced(word),
        (None, RoundResult::Correct) => spaced(game.target()),
        _ => vec!["_"; game.target().chars().count()].join(" "),
    };

    let mut lines = vec![format!("Word: {}", shown)];
    if !game.is_completed() {
        lines.push(format!("Tries left: {}", game.remaining_attempts()));
    }
    if !game.input().is_empty() && !game.is_completed() {
        let input = if game.is_shaking() {
            format!("~{}~", game.input())
        } else {
            game.input().to_string()
        };
        lines.push(format!("Your spelling: {}", input));
    }
    lines.push(if game.is_completed() {
        ":next for a new word".to_string()
    } else {
        "Type the word, :hear to listen again".to_string()
    });
    lines
}

fn writing_view(game: &WritingGame) -> Vec<String> {
    let markers: String = (0..game.position())
        .map(|i| {
            if game.incorrect_positions().contains(&i) {
                '^'
            } else {
                ' '
            }
        })
        .collect();

    let mut lines = vec![
        format!(
            "Sentence {} of {}",
            game.exercise_index() + 1,
            game.exercise_count()
        ),
        format!("Type: {}", game.target()),
        format!("You:  {}", game.typed_text()),
    ];
    if !markers.trim().is_empty() {
        lines.push(format!("      {}", markers.trim_end()));
    }
    lines.push(format!(
        "Score: {}/{}  Accuracy: {:.0}%",
        game.score(),
        game.target().chars().count(),
        game.accuracy() * 100.0
    ));
    lines
}

fn matching_view(game: &MatchingGame) -> Vec<String> {
    let level = game.level();
    let words = game.word_order();
    let pictures = game.image_order();
    let width = level.items.iter().map(|i| i.word.chars().count()).max().unwrap_or(0);

    let mark = |id: u32, selected: Option<u32>| {
        if game.completed_pairs().contains(&id) {
            "ok"
        } else if selected == Some(id) {
            "<-"
        } else {
            "  "
        }
    };

    let mut lines = vec![format!(
        "Level {} of {}: {}  ({}/{} matched)",
        game.level_index() + 1,
        game.level_count(),
        level.title,
        game.completed_pairs().len(),
        level.items.len()
    )];
    for (row, (&word_id, &picture_id)) in words.iter().zip(pictures).enumerate() {
        let word = level.item(word_id).map(|i| i.word.as_str()).unwrap_or("");
        let picture = level.item(picture_id).map(|i| i.image.as_str()).unwrap_or("");
        lines.push(format!(
            "  {}. {:<width$} {}    {}. {} {}",
            row + 1,
            word,
            mark(word_id, game.selected_word()),
            picture_label(row),
            picture,
            mark(picture_id, game.selected_image()),
        ));
    }
    lines.push("Pick a word number and a picture letter, like 2b".to_string());
    lines
}

fn speaking_view(game: &SpeakingGame<Voice, TypedDictation>) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Sentence {} of {}",
            game.exercise_index() + 1,
            game.exercise_count()
        ),
        format!("Read aloud: {}", game.exercise()),
    ];
    if game.is_recording() {
        lines.push(format!("Recording... {}s", game.elapsed_secs()));
    }
    if !game.transcript().is_empty() {
        lines.push(format!("Heard: {}", game.transcript()));
    }
    if let Some(ratio) = game.last_similarity() {
        lines.push(format!("Words matched: {:.0}%", ratio * 100.0));
    }
    if !game.is_recording() {
        lines.push(":rec to record, :hear to listen".to_string());
    }
    lines
}

fn reading_view(game: &ReadingGame) -> Vec<String> {
    let page = game.page();
    let mut lines = vec![format!(
        "{} - page {} of {}",
        game.story().title,
        game.page_index() + 1,
        game.page_count()
    )];
    lines.extend(page.paragraphs.iter().map(|p| format!("  {}", p)));
    if !page.images.is_empty() {
        lines.push(format!("  {}", page.images.join(" ")));
    }

    for question in &page.questions {
        let verdict = match game.is_correct(question.id) {
            Some(true) => "  (right!)",
            Some(false) => "  (not quite)",
            None => "",
        };
        lines.push(format!("Q{}. {}{}", question.id, question.prompt, verdict));
        let choices: Vec<String> = question
            .answers
            .iter()
            .map(|a| format!("{}) {}", a.id, a.text))
            .collect();
        lines.push(format!("    {}", choices.join("   ")));
    }

    if !page.questions.is_empty() {
        let (right, total) = game.page_score();
        lines.push(format!("Score: {}/{}", right, total));
    }
    let stories: Vec<String> = game
        .stories()
        .iter()
        .map(|s| format!("{} \"{}\"", s.id, s.title))
        .collect();
    lines.push(format!("Stories: {}  (type: story N)", stories.join(", ")));
    lines
}
