//! The static instruction alphabet: every printable symbol that can occupy a
//! memory cell maps to a 2D opcode coordinate (used by `load_inst`/
//! `write_inst` to move instructions in and out of registers) and a
//! behavior tag selecting one interpreter routine.

use crate::vec2::Vec2;

/// One axis of a 2D vector, selected by the `x`/`y` modifier tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// The behavior a symbol triggers when executed as an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    NoOperation,
    MoveUp,
    MoveDown,
    MoveRight,
    MoveLeft,
    FindTemplate,
    IfNotZero,
    One,
    Zero,
    Decrement,
    Increment,
    Subtract,
    LoadInst,
    WriteInst,
    AllocateChild,
    SplitChild,
    Push,
    Pop,
}

struct Entry {
    symbol: char,
    opcode: Vec2,
    behavior: Behavior,
}

/// The canonical symbol table from the specification, in opcode order.
const TABLE: &[Entry] = &[
    Entry { symbol: '.', opcode: Vec2::new(0, 0), behavior: Behavior::NoOperation },
    Entry { symbol: ':', opcode: Vec2::new(0, 1), behavior: Behavior::NoOperation },
    Entry { symbol: 'a', opcode: Vec2::new(1, 0), behavior: Behavior::NoOperation },
    Entry { symbol: 'b', opcode: Vec2::new(1, 1), behavior: Behavior::NoOperation },
    Entry { symbol: 'c', opcode: Vec2::new(1, 2), behavior: Behavior::NoOperation },
    Entry { symbol: 'd', opcode: Vec2::new(1, 3), behavior: Behavior::NoOperation },
    Entry { symbol: 'x', opcode: Vec2::new(2, 0), behavior: Behavior::NoOperation },
    Entry { symbol: 'y', opcode: Vec2::new(2, 1), behavior: Behavior::NoOperation },
    Entry { symbol: '^', opcode: Vec2::new(3, 0), behavior: Behavior::MoveUp },
    Entry { symbol: 'v', opcode: Vec2::new(3, 1), behavior: Behavior::MoveDown },
    Entry { symbol: '>', opcode: Vec2::new(3, 2), behavior: Behavior::MoveRight },
    Entry { symbol: '<', opcode: Vec2::new(3, 3), behavior: Behavior::MoveLeft },
    Entry { symbol: '&', opcode: Vec2::new(4, 0), behavior: Behavior::FindTemplate },
    Entry { symbol: '?', opcode: Vec2::new(5, 0), behavior: Behavior::IfNotZero },
    Entry { symbol: '1', opcode: Vec2::new(6, 0), behavior: Behavior::One },
    Entry { symbol: '0', opcode: Vec2::new(6, 1), behavior: Behavior::Zero },
    Entry { symbol: '-', opcode: Vec2::new(6, 2), behavior: Behavior::Decrement },
    Entry { symbol: '+', opcode: Vec2::new(6, 3), behavior: Behavior::Increment },
    Entry { symbol: '~', opcode: Vec2::new(6, 4), behavior: Behavior::Subtract },
    Entry { symbol: 'L', opcode: Vec2::new(7, 0), behavior: Behavior::LoadInst },
    Entry { symbol: 'W', opcode: Vec2::new(7, 1), behavior: Behavior::WriteInst },
    Entry { symbol: '@', opcode: Vec2::new(7, 2), behavior: Behavior::AllocateChild },
    Entry { symbol: '$', opcode: Vec2::new(7, 3), behavior: Behavior::SplitChild },
    Entry { symbol: 'S', opcode: Vec2::new(8, 0), behavior: Behavior::Push },
    Entry { symbol: 'P', opcode: Vec2::new(8, 1), behavior: Behavior::Pop },
];

/// The no-op filler symbol memory cells are initialized to.
pub const NOP_SYMBOL: char = '.';

/// Every symbol in the alphabet, for cosmic-ray mutation sampling.
pub fn alphabet() -> &'static [char] {
    static SYMBOLS: std::sync::OnceLock<Vec<char>> = std::sync::OnceLock::new();
    SYMBOLS.get_or_init(|| TABLE.iter().map(|e| e.symbol).collect())
}

/// Look up the behavior bound to a symbol, or `None` for an unknown symbol
/// (shouldn't occur for the closed alphabet above, but Memory cells are not
/// type-constrained, so callers must still handle it).
pub fn behavior_of(symbol: char) -> Option<Behavior> {
    TABLE.iter().find(|e| e.symbol == symbol).map(|e| e.behavior)
}

/// The opcode coordinate encoding a symbol, used by `load_inst`.
pub fn opcode_of(symbol: char) -> Option<Vec2> {
    TABLE.iter().find(|e| e.symbol == symbol).map(|e| e.opcode)
}

/// Reverse lookup: the unique symbol whose encoding equals `opcode`, used by
/// `write_inst`. Returns `None` if no symbol has that encoding.
pub fn symbol_for_opcode(opcode: Vec2) -> Option<char> {
    TABLE.iter().find(|e| e.opcode == opcode).map(|e| e.symbol)
}

/// `.`/`:` are the template alphabet; they also execute as no-ops.
pub fn is_template_symbol(symbol: char) -> bool {
    matches!(symbol, '.' | ':')
}

/// The complement of a template symbol (`.` <-> `:`), or `None` if `symbol`
/// is not a template symbol.
pub fn complement(symbol: char) -> Option<char> {
    match symbol {
        '.' => Some(':'),
        ':' => Some('.'),
        _ => None,
    }
}

/// Register identifiers, always one of `a b c d`.
pub fn is_register(symbol: char) -> bool {
    matches!(symbol, 'a' | 'b' | 'c' | 'd')
}

/// Axis modifier tokens: `x` selects the row component, `y` the column.
pub fn axis_of(symbol: char) -> Option<Axis> {
    match symbol {
        'x' => Some(Axis::X),
        'y' => Some(Axis::Y),
        _ => None,
    }
}
