// 轉接層：建置核心使用的具體協作者

pub mod precomputed;
