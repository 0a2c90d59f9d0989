use smallvec::SmallVec;
use termtrie::{Step, StepFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    /// `?`: exactly one code point.
    Any,
    /// `*`: any run of code points, including none.
    Star,
}

/// Set of pattern positions the automaton may be in, sorted and distinct.
type States = SmallVec<[u32; 8]>;

/// Glob-style matcher over code points supporting `*` and `?`.
///
/// Runs as an NFA whose state sets are kept on a stack, one per code point
/// fed.
#[derive(Debug, Clone)]
pub struct WildcardFilter {
    tokens: Vec<Token>,
    stack: Vec<States>,
}

impl WildcardFilter {
    pub fn new(pattern: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::with_capacity(pattern.len());
        for c in pattern.chars() {
            let token = match c {
                '*' => Token::Star,
                '?' => Token::Any,
                c => Token::Char(c),
            };
            // Consecutive stars are one star.
            if token == Token::Star && tokens.last() == Some(&Token::Star) {
                continue;
            }
            tokens.push(token);
        }

        let mut initial = States::new();
        closure(&tokens, 0, &mut initial);
        Self {
            tokens,
            stack: vec![initial],
        }
    }

    /// Whether the path fed so far matches the whole pattern.
    pub fn is_match(&self) -> bool {
        self.top().contains(&self.accept())
    }

    #[inline]
    fn accept(&self) -> u32 {
        self.tokens.len() as u32
    }

    #[inline]
    fn top(&self) -> &States {
        &self.stack[self.stack.len() - 1]
    }
}

/// Add `pos` and every position reachable from it by skipping stars.
fn closure(tokens: &[Token], mut pos: usize, out: &mut States) {
    loop {
        let p = pos as u32;
        if let Err(at) = out.binary_search(&p) {
            out.insert(at, p);
        }
        match tokens.get(pos) {
            Some(Token::Star) => pos += 1,
            _ => return,
        }
    }
}

impl StepFilter for WildcardFilter {
    fn step(&mut self, c: char) -> Step {
        let mut next = States::new();
        for &pos in self.top() {
            let pos = pos as usize;
            match self.tokens.get(pos) {
                Some(Token::Char(x)) if *x == c => closure(&self.tokens, pos + 1, &mut next),
                Some(Token::Any) => closure(&self.tokens, pos + 1, &mut next),
                Some(Token::Star) => closure(&self.tokens, pos, &mut next),
                _ => {}
            }
        }
        if next.is_empty() {
            return Step::Stop;
        }
        let matched = next.contains(&self.accept());
        self.stack.push(next);
        Step::Continue { matched }
    }

    fn pop(&mut self, consumed: usize) {
        let keep = self.stack.len().saturating_sub(consumed).max(1);
        self.stack.truncate(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        let mut f = WildcardFilter::new(pattern);
        for c in text.chars() {
            if f.step(c) == Step::Stop {
                return false;
            }
        }
        f.is_match()
    }

    #[test]
    fn test_literal() {
        assert!(matches("hello", "hello"));
        assert!(!matches("hello", "hell"));
        assert!(!matches("hello", "helloo"));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches("h?llo", "hallo"));
        assert!(matches("h?llo", "hüllo"));
        assert!(!matches("h?llo", "hllo"));
    }

    #[test]
    fn test_star() {
        assert!(matches("he*", "he"));
        assert!(matches("he*", "hello"));
        assert!(matches("*lo", "hello"));
        assert!(matches("h*l*o", "hello"));
        assert!(matches("**", ""));
        assert!(!matches("h*x", "hello"));
    }

    #[test]
    fn test_stop_prunes_early() {
        let mut f = WildcardFilter::new("ab*");
        assert_eq!(f.step('x'), Step::Stop);
        assert_eq!(f.step('a'), Step::Continue { matched: false });
        assert_eq!(f.step('b'), Step::Continue { matched: true });
        assert_eq!(f.step('z'), Step::Continue { matched: true });
    }

    #[test]
    fn test_long_pattern_keeps_its_tail() {
        let long = "a".repeat(70_000);
        let pattern = format!("{}*z", long);
        assert!(matches(&pattern, &format!("{}z", long)));
        assert!(matches(&pattern, &format!("{}bbz", long)));
        assert!(!matches(&pattern, &long));
    }

    #[test]
    fn test_pop_restores_state() {
        let mut f = WildcardFilter::new("a?c");
        assert_eq!(f.step('a'), Step::Continue { matched: false });
        assert_eq!(f.step('b'), Step::Continue { matched: false });
        assert_eq!(f.step('c'), Step::Continue { matched: true });
        f.pop(2);
        assert_eq!(f.step('z'), Step::Continue { matched: false });
        assert_eq!(f.step('d'), Step::Stop);
        assert!(!f.is_match());
    }
}
