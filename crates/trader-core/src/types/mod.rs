//! 자격증명 저장소와 세션 관리에서 공통으로 사용하는 타입.

mod credential;

pub use credential::*;
