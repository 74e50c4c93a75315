use std::error::Error;

use services::quiz::Tick;
use services::{
    AppServices, PlayerError, QuizController, QuizEvent, QuizOutcome, QuizPhase, ResultsRoute,
    ResultsView,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

type Input = Lines<BufReader<Stdin>>;

/// Terminal pages, in the order the player walks through them.
enum Screen {
    Login,
    Quiz,
    Results(Option<QuizOutcome>),
}

/// How a quiz screen ended.
enum QuizExit {
    Done(Option<QuizOutcome>),
    Failed,
    Quit,
}

/// Run the login → quiz → results loop until the player quits or input ends.
///
/// # Errors
///
/// Returns storage or session-restore failures; those end the program.
pub async fn run(services: &AppServices) -> Result<(), Box<dyn Error>> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = Screen::Login;

    loop {
        screen = match screen {
            Screen::Login => {
                if !login(services, &mut input).await? {
                    return Ok(());
                }
                Screen::Quiz
            }
            Screen::Quiz => match play(services, &mut input).await? {
                QuizExit::Done(outcome) => Screen::Results(outcome),
                QuizExit::Failed | QuizExit::Quit => return Ok(()),
            },
            Screen::Results(outcome) => {
                if !results(services, outcome.as_ref(), &mut input).await? {
                    return Ok(());
                }
                Screen::Login
            }
        };
    }
}

async fn login(services: &AppServices, input: &mut Input) -> Result<bool, Box<dyn Error>> {
    let players = services.players();
    println!();
    println!("Welcome!");
    loop {
        println!("Enter your name to start the quiz:");
        let Some(name) = input.next_line().await? else {
            return Ok(false);
        };
        match players.login(&name).await {
            Ok(()) => return Ok(true),
            Err(PlayerError::EmptyName) => println!("Name must not be empty!"),
            Err(err) => return Err(err.into()),
        }
    }
}

async fn play(services: &AppServices, input: &mut Input) -> Result<QuizExit, Box<dyn Error>> {
    let mut quiz = services.new_quiz();
    println!("Loading questions...");

    let phase = quiz.load().await?.clone();
    match phase {
        QuizPhase::Error(message) => {
            eprintln!("Error: {message}");
            return Ok(QuizExit::Failed);
        }
        QuizPhase::Finished => return Ok(QuizExit::Done(quiz.take_outcome())),
        _ => {}
    }

    let Some(mut ticks) = quiz.start_countdown() else {
        return Ok(QuizExit::Done(quiz.take_outcome()));
    };
    render_question(&quiz);

    loop {
        tokio::select! {
            tick = ticks.recv() => {
                if tick.is_none() || on_tick(&mut quiz).await? {
                    break;
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    println!("Progress saved; run again to resume.");
                    return Ok(QuizExit::Quit);
                };
                if on_line(&mut quiz, &line).await? {
                    break;
                }
            }
        }
    }

    drain(&mut ticks);
    Ok(QuizExit::Done(quiz.take_outcome()))
}

/// Returns true once the quiz has finished.
async fn on_tick(quiz: &mut QuizController) -> Result<bool, Box<dyn Error>> {
    match quiz.tick().await? {
        QuizEvent::Finished => {
            println!("Time is up!");
            Ok(true)
        }
        QuizEvent::Ticked { remaining } if remaining % 60 == 0 || remaining == 10 => {
            println!("[{} left]", format_clock(remaining));
            Ok(false)
        }
        _ => Ok(false),
    }
}

/// Returns true once the quiz has finished.
async fn on_line(quiz: &mut QuizController, line: &str) -> Result<bool, Box<dyn Error>> {
    let Some(question) = quiz.current_question() else {
        return Ok(true);
    };
    let Some(index) = parse_choice(line, question.choices().len()) else {
        println!("Pick a number between 1 and {}.", question.choices().len());
        return Ok(false);
    };
    let selected = question.choices()[index].clone();

    match quiz.submit_answer(&selected).await? {
        QuizEvent::Finished => Ok(true),
        _ => {
            render_question(quiz);
            Ok(false)
        }
    }
}

fn render_question(quiz: &QuizController) {
    let (Some(state), Some(question)) = (quiz.state(), quiz.current_question()) else {
        return;
    };
    println!();
    println!(
        "Question {} of {}    [{}]",
        state.current_index() + 1,
        state.questions().len(),
        format_clock(state.seconds_remaining())
    );
    println!("{}", question.prompt());
    for (i, choice) in question.choices().iter().enumerate() {
        println!("  {}) {choice}", i + 1);
    }
}

fn drain(ticks: &mut mpsc::Receiver<Tick>) {
    ticks.close();
    while ticks.try_recv().is_ok() {}
}

async fn results(
    services: &AppServices,
    outcome: Option<&QuizOutcome>,
    input: &mut Input,
) -> Result<bool, Box<dyn Error>> {
    let username = services.players().display_name().await?;
    let view = match ResultsView::from_handoff(outcome, username) {
        ResultsRoute::Show(view) => view,
        ResultsRoute::RedirectToLogin => return Ok(true),
    };

    let score = view.score;
    println!();
    println!("Quiz finished!");
    println!("Well done, {}!", view.username);
    println!("  Correct:   {}", score.correct);
    println!("  Incorrect: {}", score.incorrect);
    println!("  Answered:  {} / {}", score.answered, score.total);
    println!();
    println!("Press Enter to try again, or type q to quit.");

    let Some(line) = input.next_line().await? else {
        return Ok(false);
    };
    Ok(!line.trim().eq_ignore_ascii_case("q"))
}

/// `MM:SS` rendering of a second count.
fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parse a 1-based choice number into an index below `len`.
fn parse_choice(line: &str, len: usize) -> Option<usize> {
    let number: usize = line.trim().parse().ok()?;
    (1..=len).contains(&number).then(|| number - 1)
}
