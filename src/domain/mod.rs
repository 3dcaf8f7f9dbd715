// 領域層：模型描述、型別化產物與建置核心依賴的介面

pub mod artifacts;
pub mod model;
pub mod ports;
