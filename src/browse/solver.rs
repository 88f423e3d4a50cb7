//! 井字棋求解器：完整 minimax（无剪枝）
//!
//! 评分以 maximizer 视角：己方胜 +10 - depth，对方胜 -10 + depth，平局 0。
//! 同分时取最先检查到的格子（索引升序），保证落子序列可复现。

use std::fmt;

/// 单元格状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    X,
    O,
}

/// 玩家标记（X 或 O）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn cell(self) -> Cell {
        match self {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

impl Cell {
    /// 由页面上的格子文本解析；空白为 Empty，x / o（大小写不敏感，O 也接受 0）为对应玩家
    pub fn from_glyph(text: &str) -> Option<Cell> {
        match text.trim().to_uppercase().as_str() {
            "" => Some(Cell::Empty),
            "X" => Some(Cell::X),
            "O" | "0" => Some(Cell::O),
            _ => None,
        }
    }

    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }
}

/// 8 条获胜线：3 行、3 列、2 条对角线
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub const BOARD_CELLS: usize = 9;

/// 3x3 棋盘，按行优先存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_CELLS],
        }
    }

    /// 由 9 个格子文本构造；数量不对或出现无法识别的字符时返回 None
    pub fn from_glyphs<S: AsRef<str>>(glyphs: &[S]) -> Option<Self> {
        if glyphs.len() != BOARD_CELLS {
            return None;
        }
        let mut cells = [Cell::Empty; BOARD_CELLS];
        for (slot, glyph) in cells.iter_mut().zip(glyphs) {
            *slot = Cell::from_glyph(glyph.as_ref())?;
        }
        Some(Self { cells })
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// 在空格落子；格子越界或已占用返回 None
    pub fn with_move(&self, index: usize, mark: Mark) -> Option<Board> {
        if self.cell(index)? != Cell::Empty {
            return None;
        }
        let mut next = *self;
        next.cells[index] = mark.cell();
        Some(next)
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Empty)
            .map(|(i, _)| i)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| *c != Cell::Empty)
    }

    pub fn winner(&self) -> Option<Mark> {
        WIN_LINES.iter().find_map(|[a, b, c]| {
            let first = self.cells[*a];
            if first != Cell::Empty && first == self.cells[*b] && first == self.cells[*c] {
                first.mark()
            } else {
                None
            }
        })
    }

    /// 终局：已有胜者或棋盘已满
    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyphs: String = self
            .cells
            .iter()
            .map(|c| match c {
                Cell::Empty => '_',
                Cell::X => 'X',
                Cell::O => 'O',
            })
            .collect();
        write!(f, "{glyphs}")
    }
}

const WIN_SCORE: i32 = 10;

fn minimax(board: &mut Board, depth: i32, maximizer: Mark, to_move: Mark) -> i32 {
    match board.winner() {
        Some(m) if m == maximizer => return WIN_SCORE - depth,
        Some(_) => return -WIN_SCORE + depth,
        None => {}
    }
    if board.is_full() {
        return 0;
    }

    let maximizing = to_move == maximizer;
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for i in 0..BOARD_CELLS {
        if board.cells[i] != Cell::Empty {
            continue;
        }
        board.cells[i] = to_move.cell();
        let score = minimax(board, depth + 1, maximizer, to_move.opponent());
        board.cells[i] = Cell::Empty;
        best = if maximizing { best.max(score) } else { best.min(score) };
    }
    best
}

/// 为 maximizer 选出最优落子；棋盘已满或已分胜负时返回 None（正常结果，不是错误）
pub fn best_move(board: &Board, maximizer: Mark) -> Option<usize> {
    if board.is_terminal() {
        return None;
    }
    let mut scratch = *board;
    let mut best: Option<(usize, i32)> = None;
    for i in 0..BOARD_CELLS {
        if scratch.cells[i] != Cell::Empty {
            continue;
        }
        scratch.cells[i] = maximizer.cell();
        let score = minimax(&mut scratch, 0, maximizer, maximizer.opponent());
        scratch.cells[i] = Cell::Empty;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}
